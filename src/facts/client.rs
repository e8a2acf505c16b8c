//! Chat completion client producing location facts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::prompt::{truncate_fact, Language};
use super::FactProvider;
use crate::config::OpenAiConfig;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Coordinates as sent to the model.
#[derive(Debug, Serialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// [`FactProvider`] backed by an OpenAI-compatible chat completion API.
pub struct OpenAiFactClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiFactClient {
    /// Create a client with the configured request timeout.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn build_request(
        &self,
        latitude: f64,
        longitude: f64,
        language: Language,
    ) -> Result<ChatRequest<'_>> {
        let coordinates = serde_json::to_string(&Coordinates { latitude, longitude })?;

        Ok(ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: language.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: coordinates,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        })
    }

    async fn request_fact(
        &self,
        latitude: f64,
        longitude: f64,
        language: Language,
    ) -> Result<Option<String>> {
        let request = self.build_request(latitude, longitude, language)?;

        let response: ChatResponse = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|fact| fact.trim().to_string())
            .filter(|fact| !fact.is_empty())
            .map(|fact| truncate_fact(&fact)))
    }
}

#[async_trait]
impl FactProvider for OpenAiFactClient {
    #[instrument(skip(self), fields(model = %self.config.model))]
    async fn fetch_fact(
        &self,
        latitude: f64,
        longitude: f64,
        language: Language,
    ) -> Option<String> {
        match self.request_fact(latitude, longitude, language).await {
            Ok(fact) => {
                debug!(found = fact.is_some(), "Fact request finished");
                fact
            }
            Err(e) => {
                error!(error = %e, "Fact generation API error");
                None
            }
        }
    }
}

//! Telegram Bot API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use super::types::{ApiResponse, ChatId, WebhookInfo};
use crate::config::TelegramConfig;
use crate::error::{GeofactError, Result};

/// Outbound messaging used by the update handler.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message to a chat.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Show a chat action such as `typing`.
    async fn send_chat_action(&self, chat_id: ChatId, action: &str) -> Result<()>;
}

/// HTTP client for the Telegram Bot API.
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Create a client from configuration.
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Call a Bot API method and unwrap its response envelope.
    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(method, "Calling Telegram API");

        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            let description = response
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(GeofactError::Telegram(format!("{}: {}", method, description)));
        }

        response
            .result
            .ok_or_else(|| GeofactError::Telegram(format!("{}: missing result", method)))
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let _: bool = self.call("setWebhook", &json!({ "url": url })).await?;
        info!(url, "Webhook registered");
        Ok(())
    }

    /// Current webhook status as seen by Telegram.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", &json!({})).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: &str) -> Result<()> {
        let _: bool = self
            .call("sendChatAction", &json!({ "chat_id": chat_id, "action": action }))
            .await?;
        Ok(())
    }
}

//! Configuration management for Geofact.
//!
//! Sources, lowest precedence first: built-in defaults, an optional YAML
//! file, `GEOFACT__SECTION__KEY` environment variables, and the flat
//! variable names used by earlier deployments (`TELEGRAM_BOT_TOKEN`,
//! `OPENAI_API_KEY`, `PORT`, ...).

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::error::{GeofactError, Result};

/// Placeholder written in place of secrets when the config is rendered.
const REDACTED: &str = "<redacted>";

/// Main configuration for the Geofact service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofactConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,
    /// Fact generation backend configuration
    pub openai: OpenAiConfig,
    /// Rate limiting configuration
    pub rate_limiting: RateLimitingConfig,
    /// Application-wide settings
    pub app: AppConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Public base URL; `/webhook` is appended when registering
    pub webhook_url: Option<String>,
    /// Bot API base URL
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webhook_url: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

/// Chat completion backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub api_base: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 200,
            temperature: 1.0,
            timeout_secs: 30,
            api_base: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Requests allowed per period
    pub requests: usize,
    /// Period length in seconds
    pub period_secs: u64,
    /// How often idle limiter state is swept, in seconds
    pub cleanup_interval_secs: u64,
    /// Users not seen for this long lose their limiter state, in seconds
    pub active_user_ttl_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            requests: 1,
            period_secs: 5,
            cleanup_interval_secs: 300,
            active_user_ttl_secs: 3600,
        }
    }
}

impl RateLimitingConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn active_user_ttl(&self) -> Duration {
        Duration::from_secs(self.active_user_ttl_secs)
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name
    pub environment: String,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl GeofactConfig {
    /// Load configuration from an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("GEOFACT")
                .separator("__")
                .try_parsing(true),
        );

        Self::finish(builder, |name| std::env::var(name).ok())
    }

    /// Load configuration from a YAML string, ignoring the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml));
        Self::finish(builder, |_| None)
    }

    fn finish<F>(builder: ConfigBuilder<DefaultState>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: GeofactConfig = builder.build()?.try_deserialize()?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the flat environment variable names.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(url) = lookup("WEBHOOK_URL") {
            self.telegram.webhook_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Some(environment) = lookup("ENVIRONMENT") {
            self.app.environment = environment;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.app.log_level = level.to_lowercase();
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| GeofactError::Config(format!("invalid PORT {:?}: {}", port, e)))?;
        }
        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GeofactError::Config("server.port must be non-zero".to_string()));
        }
        if !matches!(self.app.log_format.as_str(), "text" | "json") {
            return Err(GeofactError::Config(format!(
                "app.log_format must be \"text\" or \"json\", got {:?}",
                self.app.log_format
            )));
        }
        if self.rate_limiting.requests == 0 {
            return Err(GeofactError::Config(
                "rate_limiting.requests must be greater than zero".to_string(),
            ));
        }
        if self.rate_limiting.period_secs == 0 {
            return Err(GeofactError::Config(
                "rate_limiting.period_secs must be greater than zero".to_string(),
            ));
        }
        if self.rate_limiting.cleanup_interval_secs == 0 {
            return Err(GeofactError::Config(
                "rate_limiting.cleanup_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.rate_limiting.active_user_ttl_secs < self.rate_limiting.period_secs {
            return Err(GeofactError::Config(format!(
                "rate_limiting.active_user_ttl_secs ({}) must be at least period_secs ({})",
                self.rate_limiting.active_user_ttl_secs, self.rate_limiting.period_secs
            )));
        }
        Ok(())
    }

    /// Replace the listening port and re-check the result.
    pub fn override_port(&mut self, port: u16) -> Result<()> {
        self.server.port = port;
        self.validate()
    }

    /// Whether a usable bot token is configured.
    pub fn has_telegram_token(&self) -> bool {
        self.telegram.bot_token.len() > 10
    }

    /// Whether a usable completion API key is configured.
    pub fn has_openai_key(&self) -> bool {
        self.openai.api_key.len() > 10
    }

    /// Full webhook endpoint to register with Telegram, if a base URL is set.
    pub fn webhook_endpoint(&self) -> Option<String> {
        self.telegram
            .webhook_url
            .as_deref()
            .map(|base| format!("{}/webhook", base.trim_end_matches('/')))
    }

    /// Render the configuration as YAML with secrets replaced.
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if !redacted.telegram.bot_token.is_empty() {
            redacted.telegram.bot_token = REDACTED.to_string();
        }
        if !redacted.openai.api_key.is_empty() {
            redacted.openai.api_key = REDACTED.to_string();
        }
        serde_yaml::to_string(&redacted).map_err(|e| GeofactError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = GeofactConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.max_tokens, 200);
        assert_eq!(config.openai.timeout(), Duration::from_secs(30));
        assert_eq!(config.rate_limiting.requests, 1);
        assert_eq!(config.rate_limiting.period(), Duration::from_secs(5));
        assert_eq!(config.app.environment, "development");
        assert!(config.telegram.webhook_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
server:
  port: 9000
rate_limiting:
  requests: 3
  period_secs: 10
"#;
        let config = GeofactConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.rate_limiting.requests, 3);
        assert_eq!(config.rate_limiting.period(), Duration::from_secs(10));
        assert_eq!(config.rate_limiting.cleanup_interval_secs, 300);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let yaml = r#"
rate_limiting:
  requests: 0
"#;
        let result = GeofactConfig::from_yaml(yaml);
        assert!(matches!(result, Err(GeofactError::Config(_))));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let yaml = r#"
app:
  log_format: xml
"#;
        assert!(GeofactConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = GeofactConfig::default();
        config.rate_limiting.period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_activity_ttl_shorter_than_period_rejected() {
        let yaml = r#"
rate_limiting:
  period_secs: 5
  active_user_ttl_secs: 0
"#;
        assert!(matches!(
            GeofactConfig::from_yaml(yaml),
            Err(GeofactError::Config(_))
        ));

        let mut config = GeofactConfig::default();
        config.rate_limiting.period_secs = 5;
        config.rate_limiting.active_user_ttl_secs = 4;
        assert!(config.validate().is_err());

        config.rate_limiting.active_user_ttl_secs = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_override_is_validated() {
        let mut config = GeofactConfig::default();
        config.override_port(9090).unwrap();
        assert_eq!(config.server.port, 9090);

        let result = config.override_port(0);
        assert!(matches!(result, Err(GeofactError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TELEGRAM_BOT_TOKEN", "123456:abcdefghij"),
            ("WEBHOOK_URL", "https://bot.example.com/"),
            ("OPENAI_API_KEY", "sk-test-0123456789"),
            ("LOG_LEVEL", "DEBUG"),
            ("PORT", "8443"),
        ]
        .into_iter()
        .collect();

        let mut config = GeofactConfig::default();
        config
            .apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert!(config.has_telegram_token());
        assert!(config.has_openai_key());
        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.server.port, 8443);
        assert_eq!(
            config.webhook_endpoint().as_deref(),
            Some("https://bot.example.com/webhook")
        );
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = GeofactConfig::default();
        let result = config.apply_env_overrides(|name| {
            (name == "PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(GeofactError::Config(_))));
    }

    #[test]
    fn test_empty_webhook_url_is_unset() {
        let mut config = GeofactConfig::default();
        config
            .apply_env_overrides(|name| (name == "WEBHOOK_URL").then(String::new))
            .unwrap();
        assert!(config.webhook_endpoint().is_none());
    }

    #[test]
    fn test_short_tokens_not_considered_set() {
        let mut config = GeofactConfig::default();
        config.telegram.bot_token = "short".to_string();
        assert!(!config.has_telegram_token());
        assert!(!config.has_openai_key());
    }

    #[test]
    fn test_redacted_yaml_hides_secrets() {
        let mut config = GeofactConfig::default();
        config.telegram.bot_token = "123456:secret-token".to_string();
        config.openai.api_key = "sk-secret".to_string();

        let yaml = config.to_redacted_yaml().unwrap();
        assert!(!yaml.contains("secret"));
        assert!(yaml.contains(REDACTED));
    }
}

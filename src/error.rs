//! Error types for the Geofact service.

use thiserror::Error;

/// Main error type for Geofact operations.
#[derive(Error, Debug)]
pub enum GeofactError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid rate limiter parameters
    #[error("Rate limit error: {0}")]
    RateLimit(String),

    /// Outbound HTTP failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failures
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Telegram Bot API answered with `ok: false`
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for GeofactError {
    fn from(err: config::ConfigError) -> Self {
        GeofactError::Config(err.to_string())
    }
}

/// Result type alias for Geofact operations.
pub type Result<T> = std::result::Result<T, GeofactError>;

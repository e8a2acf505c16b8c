//! Subset of the Telegram Bot API object model used by the bot.

use serde::{Deserialize, Serialize};

/// Telegram user identifier.
pub type UserId = i64;

/// Telegram chat identifier.
pub type ChatId = i64;

/// An incoming update delivered to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Message {
    /// The bot command this message carries, without the leading slash or
    /// any `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?.trim_start();
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        Some(word.split('@').next().unwrap_or(word))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Response envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub has_custom_certificate: bool,
    #[serde(default)]
    pub pending_update_count: u32,
    /// Unix time of the most recent delivery error
    #[serde(default)]
    pub last_error_date: Option<i64>,
    #[serde(default)]
    pub last_error_message: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub allowed_updates: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_location_update() {
        let payload = json!({
            "update_id": 10001,
            "message": {
                "message_id": 42,
                "date": 1700000000,
                "from": { "id": 12345, "is_bot": false, "first_name": "Anna", "language_code": "ru" },
                "chat": { "id": 12345, "type": "private" },
                "location": { "latitude": 59.9343, "longitude": 30.3351 }
            }
        });

        let update: Update = serde_json::from_value(payload).unwrap();
        let message = update.message.unwrap();

        assert_eq!(update.update_id, 10001);
        assert_eq!(message.from.unwrap().id, 12345);
        assert_eq!(message.chat.id, 12345);
        assert_eq!(
            message.location,
            Some(Location { latitude: 59.9343, longitude: 30.3351 })
        );
        assert!(message.text.is_none());
    }

    #[test]
    fn test_parse_update_without_message() {
        let payload = json!({
            "update_id": 7,
            "edited_message": { "message_id": 1, "chat": { "id": 1 } }
        });

        let update: Update = serde_json::from_value(payload).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_parse_error_envelope_without_result() {
        let payload = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;

        let response: ApiResponse<WebhookInfo> = serde_json::from_str(payload).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_command_parsing() {
        let message = |text: &str| Message {
            message_id: 1,
            from: None,
            chat: Chat { id: 1 },
            text: Some(text.to_string()),
            location: None,
        };

        assert_eq!(message("/start").command(), Some("start"));
        assert_eq!(message("/help@geofact_bot").command(), Some("help"));
        assert_eq!(message("/start payload").command(), Some("start"));
        assert_eq!(message("hello").command(), None);
        assert_eq!(message("/").command(), None);
    }
}

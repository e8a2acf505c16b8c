//! Test doubles shared across module tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{GeofactError, Result};
use crate::facts::{FactProvider, Language};
use crate::telegram::{Chat, ChatId, Location, Message, Messenger, Update, User, UserId};

/// Records everything the bot tries to send.
#[derive(Default)]
pub struct RecordingMessenger {
    pub messages: Mutex<Vec<(ChatId, String)>>,
    pub actions: Mutex<Vec<(ChatId, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.messages.lock().push((chat_id, text.to_string()));
        if self.fail {
            return Err(GeofactError::Telegram("sendMessage: blocked".to_string()));
        }
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: &str) -> Result<()> {
        self.actions.lock().push((chat_id, action.to_string()));
        if self.fail {
            return Err(GeofactError::Telegram("sendChatAction: blocked".to_string()));
        }
        Ok(())
    }
}

/// Returns a fixed answer and counts calls.
pub struct StaticFacts {
    pub answer: Option<String>,
    pub calls: AtomicUsize,
}

impl StaticFacts {
    pub fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FactProvider for StaticFacts {
    async fn fetch_fact(&self, _: f64, _: f64, _: Language) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// A private-chat location message from `user_id`.
pub fn location_update(update_id: i64, user_id: UserId) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            from: Some(User {
                id: user_id,
                is_bot: false,
                first_name: "Test".to_string(),
                language_code: Some("ru".to_string()),
            }),
            chat: Chat { id: user_id },
            text: None,
            location: Some(Location {
                latitude: 55.7558,
                longitude: 37.6173,
            }),
        }),
    }
}

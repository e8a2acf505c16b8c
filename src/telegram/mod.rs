//! Telegram Bot API surface.

mod client;
mod types;

pub use client::{Messenger, TelegramClient};
pub use types::{ApiResponse, Chat, ChatId, Location, Message, Update, User, UserId, WebhookInfo};

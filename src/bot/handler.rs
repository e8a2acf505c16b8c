//! Dispatches webhook updates to commands and the location flow.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::replies;
use crate::facts::{FactProvider, Language};
use crate::ratelimit::{ActivityTracker, RateLimiter};
use crate::telegram::{ChatId, Location, Messenger, Update, UserId};

/// The location bot: rate limits users and answers locations with facts.
pub struct LocationBot {
    limiter: Arc<RateLimiter<UserId>>,
    activity: Arc<ActivityTracker<UserId>>,
    facts: Arc<dyn FactProvider>,
    messenger: Arc<dyn Messenger>,
}

impl LocationBot {
    pub fn new(
        limiter: Arc<RateLimiter<UserId>>,
        activity: Arc<ActivityTracker<UserId>>,
        facts: Arc<dyn FactProvider>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            limiter,
            activity,
            facts,
            messenger,
        }
    }

    /// Handle a single update. Delivery failures are logged, not returned.
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            debug!("Ignoring update without a message");
            return;
        };
        let chat_id = message.chat.id;

        if let Some(command) = message.command() {
            match command {
                "start" => self.reply(chat_id, replies::WELCOME).await,
                "help" => self.reply(chat_id, replies::HELP).await,
                other => debug!(command = other, "Ignoring unknown command"),
            }
            return;
        }

        let (Some(location), Some(user)) = (message.location, message.from) else {
            debug!("Ignoring message without location or sender");
            return;
        };

        self.handle_location(user.id, chat_id, location).await;
    }

    async fn handle_location(&self, user_id: UserId, chat_id: ChatId, location: Location) {
        info!(
            user_id,
            latitude = location.latitude,
            longitude = location.longitude,
            "Received location"
        );
        self.activity.touch(&user_id);

        if !self.limiter.has_capacity(&user_id) {
            info!(
                user_id,
                retry_in_ms = self.limiter.time_until_capacity(&user_id).as_millis() as u64,
                "User is rate limited"
            );
            self.reply(chat_id, replies::RATE_LIMITED).await;
            return;
        }

        self.limiter.acquire(&user_id).await;

        if let Err(e) = self.messenger.send_chat_action(chat_id, "typing").await {
            warn!(error = %e, chat_id, "Failed to send typing action");
        }

        let fact = self
            .facts
            .fetch_fact(location.latitude, location.longitude, Language::Ru)
            .await;

        match fact {
            Some(fact) => self.reply(chat_id, &replies::fact(&fact)).await,
            None => self.reply(chat_id, replies::NO_FACT).await,
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_message(chat_id, text).await {
            warn!(error = %e, chat_id, "Failed to send reply");
        }
    }
}

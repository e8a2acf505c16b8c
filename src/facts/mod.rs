//! Location fact generation.

mod client;
mod prompt;

pub use client::OpenAiFactClient;
pub use prompt::{truncate_fact, Language, MAX_FACT_CHARS};

use async_trait::async_trait;

/// Source of interesting facts about a location.
///
/// Implementations swallow their own failures: `None` means no fact could be
/// produced and the caller should apologise to the user.
#[async_trait]
pub trait FactProvider: Send + Sync {
    /// Find a fact about a place near the given coordinates.
    async fn fetch_fact(&self, latitude: f64, longitude: f64, language: Language)
        -> Option<String>;
}

//! Prompts and reply shaping.

use serde::{Deserialize, Serialize};

/// Longest fact sent back to a user, in characters.
pub const MAX_FACT_CHARS: usize = 512;

const ELLIPSIS: &str = "...";

const SYSTEM_PROMPT_RU: &str = "Ты гид по местности. Пользователь отправляет тебе координаты.
Найди интересный, необычный или малоизвестный факт о любом месте в радиусе 500 метров от этих координат.
Ответь одним-двумя предложениями, не более 512 символов. Не используй markdown и ссылки.";

const SYSTEM_PROMPT_EN: &str = "You are a local guide. The user sends you coordinates.
Find an interesting, unusual or little-known fact about any place within 500 meters of these coordinates.
Reply with one or two sentences, no more than 512 characters. Don't use markdown or links.";

/// Reply language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    /// System prompt instructing the model in this language.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Language::Ru => SYSTEM_PROMPT_RU,
            Language::En => SYSTEM_PROMPT_EN,
        }
    }
}

/// Cut `fact` to [`MAX_FACT_CHARS`], marking the cut with an ellipsis.
pub fn truncate_fact(fact: &str) -> String {
    if fact.chars().count() <= MAX_FACT_CHARS {
        return fact.to_string();
    }

    let keep = MAX_FACT_CHARS - ELLIPSIS.len();
    let mut truncated: String = fact.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

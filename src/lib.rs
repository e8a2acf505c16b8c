//! Geofact - location fact bot for Telegram
//!
//! Users share a location and receive an interesting fact about a place
//! nearby, generated by a chat completion model. Each user is held to a
//! sliding window rate limit enforced by [`ratelimit::RateLimiter`].

pub mod bot;
pub mod config;
pub mod error;
pub mod facts;
pub mod http;
pub mod ratelimit;
pub mod telegram;

#[cfg(test)]
pub(crate) mod testing;

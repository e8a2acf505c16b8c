//! Update handling for the location bot.

mod handler;
mod replies;

pub use handler::LocationBot;

//! HTTP surface: Telegram webhook and status endpoints.

mod routes;
mod server;

pub use routes::{router, AppState};
pub use server::HttpServer;

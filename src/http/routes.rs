//! HTTP routes: webhook intake plus status endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::bot::LocationBot;
use crate::config::GeofactConfig;
use crate::telegram::{TelegramClient, Update, WebhookInfo};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<LocationBot>,
    pub telegram: Arc<TelegramClient>,
    pub config: Arc<GeofactConfig>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/config", get(config_check))
        .route("/webhook", post(webhook))
        .route("/webhook/info", get(webhook_info))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "bot": "Location TG Bot" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Report which settings are present without exposing them.
async fn config_check(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "telegram_token_set": config.has_telegram_token(),
        "openai_key_set": config.has_openai_key(),
        "webhook_url": config.telegram.webhook_url,
        "environment": config.app.environment,
        "port": config.server.port,
        "log_level": config.app.log_level,
    }))
}

/// Accept an update from Telegram.
///
/// Always answers 200, even for payloads we cannot parse, so Telegram does
/// not keep redelivering them.
async fn webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let request_id = Uuid::new_v4();
    let span = info_span!("webhook", %request_id);

    async move {
        debug!(bytes = body.len(), "Received webhook request");

        match serde_json::from_slice::<Update>(&body) {
            Ok(update) => {
                info!(update_id = update.update_id, "Processing update");
                state.bot.handle_update(update).await;
            }
            Err(e) => warn!(error = %e, "Discarding malformed update"),
        }

        StatusCode::OK
    }
    .instrument(span)
    .await
}

async fn webhook_info(State(state): State<AppState>) -> Json<Value> {
    match state.telegram.get_webhook_info().await {
        Ok(info) => Json(json!({ "webhook_info": render_webhook_info(&info) })),
        Err(e) => {
            warn!(error = %e, "Failed to fetch webhook info");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

fn render_webhook_info(info: &WebhookInfo) -> Value {
    let last_error_date = info
        .last_error_date
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339());

    json!({
        "url": info.url,
        "has_custom_certificate": info.has_custom_certificate,
        "pending_update_count": info.pending_update_count,
        "last_error_date": last_error_date,
        "last_error_message": info.last_error_message,
        "max_connections": info.max_connections,
        "allowed_updates": info.allowed_updates,
    })
}

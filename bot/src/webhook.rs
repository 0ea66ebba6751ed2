//! HTTP receiver for Telegram webhook updates

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::services::ingest::{InboundMessage, IngestOutcome};
use crate::state::AppState;

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: Option<i64>,
    pub message: Option<TelegramMessage>,
    pub channel_post: Option<TelegramMessage>,
    pub edited_channel_post: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: Option<TelegramChat>,
    /// Unix seconds
    pub date: Option<i64>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl TelegramUpdate {
    /// The first carried message that has text (or a caption).
    pub fn into_inbound(self, now: DateTime<Utc>) -> Option<InboundMessage> {
        let msg = self.message.or(self.channel_post).or(self.edited_channel_post)?;
        let text = msg.text.or(msg.caption).filter(|t| !t.trim().is_empty())?;
        Some(InboundMessage {
            message_id: msg.message_id,
            chat_id: msg.chat.map(|c| c.id),
            text,
            // Arrival time drives the match window, not Telegram's date.
            received_at: now,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/telegram/webhook", post(telegram_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn telegram_webhook(State(state): State<Arc<AppState>>, headers: HeaderMap, body: String) -> Response {
    if let Some(secret) = state.webhook_secret.as_deref() {
        let supplied = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if supplied != Some(secret) {
            warn!("Rejected webhook call with a missing or wrong secret token");
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
        }
    }

    let update: TelegramUpdate = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            // Telegram retries anything but 2xx, so a bad body is acked.
            warn!("Ignoring malformed Telegram update: {}", e);
            return ok();
        }
    };
    let update_id = update.update_id;
    let Some(inbound) = update.into_inbound(Utc::now()) else {
        debug!("Update {:?} carries no text message", update_id);
        return ok();
    };

    match state.ingest.ingest(inbound).await {
        Ok(outcome) => {
            debug!("Update {:?} ingested: {}", update_id, outcome_label(&outcome));
            ok()
        }
        Err(e) => {
            error!("Failed to ingest update {:?}: {:#}", update_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn ok() -> Response {
    Json(json!({ "ok": true })).into_response()
}

fn outcome_label(outcome: &IngestOutcome) -> &'static str {
    match outcome {
        IngestOutcome::Created(_) => "created",
        IngestOutcome::Duplicate => "duplicate",
        IngestOutcome::Resolved(_) => "resolved",
        IngestOutcome::Unmatched => "unmatched",
        IngestOutcome::Ignored => "ignored",
    }
}

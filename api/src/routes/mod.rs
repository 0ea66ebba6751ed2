use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub mod alerts;
pub mod favorites;
pub mod goals;
pub mod journal;
pub mod push;
pub mod realtime;
pub mod signals;
pub mod wallet;

/// Mutation response: the caller's refreshed list and a message to show.
#[derive(Debug, Serialize)]
pub struct Refreshed<T: Serialize> {
    pub message: String,
    pub items: Vec<T>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(alerts::router())
        .merge(favorites::router())
        .merge(journal::router())
        .merge(wallet::router())
        .merge(goals::router())
        .merge(push::router())
        .merge(signals::router())
        .merge(realtime::router())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

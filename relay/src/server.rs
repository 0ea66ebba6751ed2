//! Local HTTP endpoint the popup and the broker tab post message actions to

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::command::{RelayCommand, RelayError};
use crate::worker::RelayHandle;

pub fn router(handle: RelayHandle) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/message", post(message))
        // Extension pages call in from their own origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(handle)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn message(State(handle): State<RelayHandle>, payload: Result<Json<RelayCommand>, JsonRejection>) -> Response {
    let Json(command) = match payload {
        Ok(command) => command,
        Err(rejection) => {
            warn!("Unreadable message action: {}", rejection.body_text());
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match handle.request(command).await {
        Ok(reply) => {
            let mut body = serde_json::to_value(&reply).unwrap_or_else(|_| json!({}));
            if let Value::Object(map) = &mut body {
                map.insert("success".to_string(), Value::Bool(true));
            }
            Json(body).into_response()
        }
        Err(e) => {
            let status = match &e {
                RelayError::Unsupported(_) => StatusCode::BAD_REQUEST,
                RelayError::SignalNotFound(_) => StatusCode::NOT_FOUND,
                RelayError::Store(_) | RelayError::WorkerGone => StatusCode::INTERNAL_SERVER_ERROR,
            };
            failure(status, e.to_string())
        }
    }
}

fn failure(status: StatusCode, error: String) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::entity::signals;
use shared::{SignalStats, SignalStatus};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/signals", get(list_signals))
        .route("/api/signals/stats", get(signal_stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignalQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
}

async fn list_signals(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SignalQuery>,
) -> ApiResult<Json<Vec<signals::Model>>> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(SignalStatus::from_str(raw).ok_or(ApiError::BadRequest("error_invalid_status"))?),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.signals.list_recent(status, limit).await?))
}

async fn signal_stats(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<SignalStats>> {
    Ok(Json(state.signals.stats(None).await?))
}

//! Web Push subscription lifecycle

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use shared::repositories::SubscriptionKeys;
use shared::ChangeKind;
use tracing::info;

use crate::auth::{AuthUser, Lang};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const TABLE: &str = "push_subscriptions";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/push/vapid-key", get(vapid_key))
        .route("/api/push/subscribe", post(subscribe))
        .route("/api/push/unsubscribe", post(unsubscribe))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKey {
    pub public_key: String,
}

/// The browser's `PushSubscription.toJSON()`.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub message: String,
    pub subscribed: bool,
}

async fn vapid_key(State(state): State<AppState>) -> ApiResult<Json<VapidKey>> {
    let public_key = state.vapid_public_key.clone().ok_or(ApiError::NotFound)?;
    Ok(Json(VapidKey { public_key }))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(req): Json<SubscribeRequest>,
) -> ApiResult<Json<PushResponse>> {
    if !req.endpoint.starts_with("https://") {
        return Err(ApiError::BadRequest("error_invalid_endpoint"));
    }
    if req.keys.p256dh.is_empty() || req.keys.auth.is_empty() {
        return Err(ApiError::BadRequest("error_invalid_keys"));
    }
    let subscription = state.subscriptions.upsert(user, &req.endpoint, req.keys).await?;
    info!("Push subscription {} stored for {}", subscription.id, user);
    state.publish(TABLE, ChangeKind::Insert, Some(subscription.id), Some(user)).await;
    Ok(Json(PushResponse {
        message: lang.t("push_subscribed"),
        subscribed: true,
    }))
}

/// Idempotent: unsubscribing an unknown endpoint still succeeds.
async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(req): Json<UnsubscribeRequest>,
) -> ApiResult<Json<PushResponse>> {
    if state.subscriptions.remove(user, &req.endpoint).await? {
        info!("Push subscription removed for {}", user);
        state.publish(TABLE, ChangeKind::Delete, None, Some(user)).await;
    }
    Ok(Json(PushResponse {
        message: lang.t("push_unsubscribed"),
        subscribed: false,
    }))
}

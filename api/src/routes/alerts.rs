use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::entity::price_alerts;
use shared::repositories::{AlertPatch, NewAlert};
use shared::{ChangeKind, NotificationType, PushPayload};
use tracing::info;

use super::Refreshed;
use crate::auth::{AuthUser, HookCaller, Lang};
use crate::error::{ApiError, ApiResult};
use crate::i18n;
use crate::state::AppState;

const TABLE: &str = "price_alerts";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", post(create_alert).get(list_alerts))
        .route("/api/alerts/:id", patch(update_alert).delete(delete_alert))
        .route("/api/alerts/evaluate", post(evaluate_alerts))
}

async fn list_alerts(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<price_alerts::Model>>> {
    Ok(Json(state.alerts.list_for_user(user).await?))
}

async fn refreshed(state: &AppState, user: uuid::Uuid, message: String) -> ApiResult<Json<Refreshed<price_alerts::Model>>> {
    let items = state.alerts.list_for_user(user).await?;
    Ok(Json(Refreshed { message, items }))
}

async fn create_alert(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(new): Json<NewAlert>,
) -> ApiResult<Json<Refreshed<price_alerts::Model>>> {
    if new.symbol.trim().is_empty() {
        return Err(ApiError::BadRequest("error_symbol_required"));
    }
    if !(new.target_price > 0.0) {
        return Err(ApiError::BadRequest("error_price_positive"));
    }
    let alert = state.alerts.create(user, new).await?;
    state.publish(TABLE, ChangeKind::Insert, Some(alert.id), Some(user)).await;
    refreshed(&state, user, lang.t("alert_created")).await
}

async fn update_alert(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
    Json(patch): Json<AlertPatch>,
) -> ApiResult<Json<Refreshed<price_alerts::Model>>> {
    if patch.target_price.is_some_and(|p| !(p > 0.0)) {
        return Err(ApiError::BadRequest("error_price_positive"));
    }
    let alert = state.alerts.update(user, id, patch).await?.ok_or(ApiError::NotFound)?;
    state.publish(TABLE, ChangeKind::Update, Some(alert.id), Some(user)).await;
    refreshed(&state, user, lang.t("alert_updated")).await
}

async fn delete_alert(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> ApiResult<Json<Refreshed<price_alerts::Model>>> {
    if !state.alerts.delete(user, id).await? {
        return Err(ApiError::NotFound);
    }
    state.publish(TABLE, ChangeKind::Delete, Some(id), Some(user)).await;
    refreshed(&state, user, lang.t("alert_deleted")).await
}

#[derive(Debug, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct Evaluation {
    pub triggered: Vec<price_alerts::Model>,
}

/// Price-tick hook for the market watcher; spans all users.
async fn evaluate_alerts(
    State(state): State<AppState>,
    _caller: HookCaller,
    Json(tick): Json<PriceTick>,
) -> ApiResult<Json<Evaluation>> {
    if tick.symbol.trim().is_empty() || !tick.price.is_finite() {
        return Err(ApiError::BadRequest("error_invalid_tick"));
    }
    let triggered = state.alerts.trigger_matching(&tick.symbol, tick.price, Utc::now()).await?;
    if !triggered.is_empty() {
        info!("{} alerts triggered for {} at {}", triggered.len(), tick.symbol, tick.price);
    }

    let price = tick.price.to_string();
    for alert in &triggered {
        state.publish(TABLE, ChangeKind::Update, Some(alert.id), Some(alert.user_id)).await;

        let locale = state.default_locale.as_str();
        let title = i18n::translate(locale, "push_alert_title", Some(&[("symbol", alert.symbol.as_str())]));
        let body_key = format!("push_alert_body_{}", alert.condition);
        let target = alert.target_price.to_string();
        let body = i18n::translate(
            locale,
            &body_key,
            Some(&[("price", price.as_str()), ("target", target.as_str())]),
        );
        state.notify_user(
            alert.user_id,
            PushPayload::new(NotificationType::PriceAlert, title, body).with_alert(alert.id),
        );
    }

    Ok(Json(Evaluation { triggered }))
}

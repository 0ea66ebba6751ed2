//! Virtual wallet and paper trades

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::entity::{trades, wallets};
use shared::repositories::{CloseOutcome, NewTrade};
use shared::{ChangeKind, NotificationType, PushPayload};
use tracing::info;

use super::Refreshed;
use crate::auth::{AuthUser, Lang};
use crate::error::{ApiError, ApiResult};
use crate::i18n;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/wallet", get(get_wallet))
        .route("/api/wallet/reset", post(reset_wallet))
        .route("/api/trades", get(list_trades).post(open_trade))
        .route("/api/trades/:id", delete(delete_trade))
        .route("/api/trades/:id/close", post(close_trade))
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub message: String,
    pub wallet: wallets::Model,
}

async fn get_wallet(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<wallets::Model>> {
    Ok(Json(state.trades.wallet(user).await?))
}

async fn reset_wallet(State(state): State<AppState>, AuthUser(user): AuthUser, lang: Lang) -> ApiResult<Json<WalletResponse>> {
    let wallet = state.trades.reset_wallet(user).await?;
    info!("Wallet of {} reset to {}", user, wallet.balance);
    state.publish("wallets", ChangeKind::Update, None, Some(user)).await;
    Ok(Json(WalletResponse {
        message: lang.t("wallet_reset"),
        wallet,
    }))
}

async fn list_trades(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<trades::Model>>> {
    Ok(Json(state.trades.list_for_user(user).await?))
}

async fn open_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(new): Json<NewTrade>,
) -> ApiResult<Json<Refreshed<trades::Model>>> {
    if new.symbol.trim().is_empty() {
        return Err(ApiError::BadRequest("error_symbol_required"));
    }
    if !(new.entry_price > 0.0) {
        return Err(ApiError::BadRequest("error_price_positive"));
    }
    if !(new.amount > 0.0) {
        return Err(ApiError::BadRequest("error_amount_positive"));
    }
    let trade = state.trades.open(user, new).await?;
    state.publish("trades", ChangeKind::Insert, Some(trade.id), Some(user)).await;
    Ok(Json(Refreshed {
        message: lang.t("trade_opened"),
        items: state.trades.list_for_user(user).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    pub exit_price: f64,
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub message: String,
    pub trade: trades::Model,
    pub wallet: wallets::Model,
    pub items: Vec<trades::Model>,
}

async fn close_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
    Json(req): Json<CloseRequest>,
) -> ApiResult<Json<CloseResponse>> {
    if !(req.exit_price > 0.0) {
        return Err(ApiError::BadRequest("error_price_positive"));
    }
    let closed = match state.trades.close(user, id, req.exit_price, Utc::now()).await? {
        CloseOutcome::Closed(closed) => closed,
        CloseOutcome::NotFound => return Err(ApiError::NotFound),
        CloseOutcome::AlreadyClosed => return Err(ApiError::BadRequest("error_trade_closed")),
    };

    let profit_loss = closed.trade.profit_loss.unwrap_or_default();
    info!("Trade {} of {} closed with P&L {:.2}", id, user, profit_loss);
    state.publish("trades", ChangeKind::Update, Some(id), Some(user)).await;
    state.publish("wallets", ChangeKind::Update, None, Some(user)).await;

    let pnl = format!("{:.2}", profit_loss);
    let title = i18n::translate(&lang.0, "push_trade_title", Some(&[("symbol", closed.trade.symbol.as_str())]));
    let body = i18n::translate(&lang.0, "push_trade_body", Some(&[("pnl", pnl.as_str())]));
    state.notify_user(user, PushPayload::new(NotificationType::Trade, title, body));

    Ok(Json(CloseResponse {
        message: lang.t("trade_closed"),
        trade: closed.trade,
        wallet: closed.wallet,
        items: state.trades.list_for_user(user).await?,
    }))
}

async fn delete_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> ApiResult<Json<Refreshed<trades::Model>>> {
    if !state.trades.delete(user, id).await? {
        return Err(ApiError::NotFound);
    }
    state.publish("trades", ChangeKind::Delete, Some(id), Some(user)).await;
    Ok(Json(Refreshed {
        message: lang.t("trade_deleted"),
        items: state.trades.list_for_user(user).await?,
    }))
}

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use shared::entity::journal_entries;
use shared::repositories::{JournalPatch, NewJournalEntry};
use shared::ChangeKind;
use uuid::Uuid;

use super::Refreshed;
use crate::auth::{AuthUser, Lang};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const TABLE: &str = "journal_entries";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/journal", get(list_entries).post(create_entry))
        .route("/api/journal/:id", patch(update_entry).delete(delete_entry))
}

async fn list_entries(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<journal_entries::Model>>> {
    Ok(Json(state.journal.list_for_user(user).await?))
}

async fn refreshed(state: &AppState, user: Uuid, message: String) -> ApiResult<Json<Refreshed<journal_entries::Model>>> {
    let items = state.journal.list_for_user(user).await?;
    Ok(Json(Refreshed { message, items }))
}

async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(new): Json<NewJournalEntry>,
) -> ApiResult<Json<Refreshed<journal_entries::Model>>> {
    if new.symbol.trim().is_empty() {
        return Err(ApiError::BadRequest("error_symbol_required"));
    }
    if !(new.entry_price > 0.0) {
        return Err(ApiError::BadRequest("error_price_positive"));
    }
    let entry = state.journal.create(user, new).await?;
    state.publish(TABLE, ChangeKind::Insert, Some(entry.id), Some(user)).await;
    refreshed(&state, user, lang.t("journal_created")).await
}

async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
    Json(patch): Json<JournalPatch>,
) -> ApiResult<Json<Refreshed<journal_entries::Model>>> {
    let entry = state.journal.update(user, id, patch).await?.ok_or(ApiError::NotFound)?;
    state.publish(TABLE, ChangeKind::Update, Some(entry.id), Some(user)).await;
    refreshed(&state, user, lang.t("journal_updated")).await
}

async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> ApiResult<Json<Refreshed<journal_entries::Model>>> {
    if !state.journal.delete(user, id).await? {
        return Err(ApiError::NotFound);
    }
    state.publish(TABLE, ChangeKind::Delete, Some(id), Some(user)).await;
    refreshed(&state, user, lang.t("journal_deleted")).await
}

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use shared::entity::favorites;
use shared::ChangeKind;

use super::Refreshed;
use crate::auth::{AuthUser, Lang};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const TABLE: &str = "favorites";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route("/api/favorites/:id", delete(remove_favorite))
}

#[derive(Debug, Deserialize)]
pub struct NewFavorite {
    pub symbol: String,
}

async fn list_favorites(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<favorites::Model>>> {
    Ok(Json(state.favorites.list_for_user(user).await?))
}

async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(new): Json<NewFavorite>,
) -> ApiResult<Json<Refreshed<favorites::Model>>> {
    if new.symbol.trim().is_empty() {
        return Err(ApiError::BadRequest("error_symbol_required"));
    }
    let favorite = state.favorites.add(user, &new.symbol).await?;
    state.publish(TABLE, ChangeKind::Insert, Some(favorite.id), Some(user)).await;
    Ok(Json(Refreshed {
        message: lang.t("favorite_added"),
        items: state.favorites.list_for_user(user).await?,
    }))
}

async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> ApiResult<Json<Refreshed<favorites::Model>>> {
    if !state.favorites.remove(user, id).await? {
        return Err(ApiError::NotFound);
    }
    state.publish(TABLE, ChangeKind::Delete, Some(id), Some(user)).await;
    Ok(Json(Refreshed {
        message: lang.t("favorite_removed"),
        items: state.favorites.list_for_user(user).await?,
    }))
}

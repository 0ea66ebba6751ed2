use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use shared::entity::goals;
use shared::repositories::{GoalPatch, NewGoal};
use shared::{ChangeKind, NotificationType, PushPayload};
use uuid::Uuid;

use super::Refreshed;
use crate::auth::{AuthUser, Lang};
use crate::error::{ApiError, ApiResult};
use crate::i18n;
use crate::state::AppState;

const TABLE: &str = "goals";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/:id", patch(update_goal).delete(delete_goal))
}

async fn list_goals(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<goals::Model>>> {
    Ok(Json(state.goals.list_for_user(user).await?))
}

async fn refreshed(state: &AppState, user: Uuid, message: String) -> ApiResult<Json<Refreshed<goals::Model>>> {
    let items = state.goals.list_for_user(user).await?;
    Ok(Json(Refreshed { message, items }))
}

async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Json(new): Json<NewGoal>,
) -> ApiResult<Json<Refreshed<goals::Model>>> {
    if new.title.trim().is_empty() {
        return Err(ApiError::BadRequest("error_title_required"));
    }
    if !(new.target_amount > 0.0) {
        return Err(ApiError::BadRequest("error_amount_positive"));
    }
    let goal = state.goals.create(user, new).await?;
    state.publish(TABLE, ChangeKind::Insert, Some(goal.id), Some(user)).await;
    refreshed(&state, user, lang.t("goal_created")).await
}

async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
    Json(patch): Json<GoalPatch>,
) -> ApiResult<Json<Refreshed<goals::Model>>> {
    if patch.target_amount.is_some_and(|a| !(a > 0.0)) {
        return Err(ApiError::BadRequest("error_amount_positive"));
    }
    let was_achieved = state
        .goals
        .find_for_user(user, id)
        .await?
        .ok_or(ApiError::NotFound)?
        .achieved;

    let goal = state.goals.update(user, id, patch).await?.ok_or(ApiError::NotFound)?;
    state.publish(TABLE, ChangeKind::Update, Some(goal.id), Some(user)).await;

    if goal.achieved && !was_achieved {
        let locale = lang.0.as_str();
        let title = i18n::translate(locale, "push_goal_title", None);
        let body = i18n::translate(locale, "push_goal_body", Some(&[("title", goal.title.as_str())]));
        state.notify_user(user, PushPayload::new(NotificationType::Goal, title, body));
    }

    refreshed(&state, user, lang.t("goal_updated")).await
}

async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> ApiResult<Json<Refreshed<goals::Model>>> {
    if !state.goals.delete(user, id).await? {
        return Err(ApiError::NotFound);
    }
    state.publish(TABLE, ChangeKind::Delete, Some(id), Some(user)).await;
    refreshed(&state, user, lang.t("goal_deleted")).await
}

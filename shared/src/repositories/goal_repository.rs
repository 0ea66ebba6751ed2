use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sea_orm::{prelude::*, ActiveValue, Order, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;

use crate::entity::goals;

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct GoalRepository {
    db: Arc<DatabaseConnection>,
}

impl GoalRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<goals::Model>> {
        let rows = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id))
            .order_by(goals::Column::CreatedAt, Order::Desc)
            .order_by(goals::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn find_for_user(&self, user_id: Uuid, id: i32) -> Result<Option<goals::Model>> {
        let goal = goals::Entity::find_by_id(id)
            .filter(goals::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;
        Ok(goal)
    }

    pub async fn create(&self, user_id: Uuid, new: NewGoal) -> Result<goals::Model> {
        let goal = goals::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            title: ActiveValue::Set(new.title.trim().to_string()),
            target_amount: ActiveValue::Set(new.target_amount),
            current_amount: ActiveValue::Set(new.current_amount),
            deadline: ActiveValue::Set(new.deadline),
            achieved: ActiveValue::Set(new.current_amount >= new.target_amount),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        Ok(goal.insert(self.db.as_ref()).await?)
    }

    /// `achieved` is recomputed from the amounts after every update.
    pub async fn update(&self, user_id: Uuid, id: i32, patch: GoalPatch) -> Result<Option<goals::Model>> {
        let Some(goal) = self.find_for_user(user_id, id).await? else {
            return Ok(None);
        };

        let target = patch.target_amount.unwrap_or(goal.target_amount);
        let current = patch.current_amount.unwrap_or(goal.current_amount);

        let mut update: goals::ActiveModel = goal.into();
        if let Some(title) = patch.title {
            update.title = ActiveValue::Set(title.trim().to_string());
        }
        if let Some(deadline) = patch.deadline {
            update.deadline = ActiveValue::Set(Some(deadline));
        }
        update.target_amount = ActiveValue::Set(target);
        update.current_amount = ActiveValue::Set(current);
        update.achieved = ActiveValue::Set(current >= target);
        Ok(Some(update.update(self.db.as_ref()).await?))
    }

    pub async fn delete(&self, user_id: Uuid, id: i32) -> Result<bool> {
        let result = goals::Entity::delete_many()
            .filter(goals::Column::Id.eq(id))
            .filter(goals::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

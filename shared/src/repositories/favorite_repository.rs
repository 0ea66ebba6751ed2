use anyhow::Result;
use chrono::Utc;
use sea_orm::{prelude::*, ActiveValue, Order, QueryOrder};
use std::sync::Arc;

use crate::entity::favorites;

#[derive(Clone)]
pub struct FavoriteRepository {
    db: Arc<DatabaseConnection>,
}

impl FavoriteRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<favorites::Model>> {
        let rows = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .order_by(favorites::Column::CreatedAt, Order::Desc)
            .order_by(favorites::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Adding a symbol twice returns the existing row.
    pub async fn add(&self, user_id: Uuid, symbol: &str) -> Result<favorites::Model> {
        let symbol = symbol.trim().to_uppercase();
        let existing = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::Symbol.eq(symbol.as_str()))
            .one(self.db.as_ref())
            .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let favorite = favorites::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(symbol),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        Ok(favorite.insert(self.db.as_ref()).await?)
    }

    pub async fn remove(&self, user_id: Uuid, id: i32) -> Result<bool> {
        let result = favorites::Entity::delete_many()
            .filter(favorites::Column::Id.eq(id))
            .filter(favorites::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

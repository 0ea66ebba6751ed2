use anyhow::Result;
use chrono::Utc;
use sea_orm::{prelude::*, ActiveValue, Order, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;

use crate::entity::journal_entries;
use crate::models::{Direction, SignalResult};

#[derive(Debug, Clone, Deserialize)]
pub struct NewJournalEntry {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub amount: Option<f64>,
    pub outcome: Option<SignalResult>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalPatch {
    pub exit_price: Option<f64>,
    pub amount: Option<f64>,
    pub outcome: Option<SignalResult>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct JournalRepository {
    db: Arc<DatabaseConnection>,
}

impl JournalRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<journal_entries::Model>> {
        let rows = journal_entries::Entity::find()
            .filter(journal_entries::Column::UserId.eq(user_id))
            .order_by(journal_entries::Column::CreatedAt, Order::Desc)
            .order_by(journal_entries::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, user_id: Uuid, new: NewJournalEntry) -> Result<journal_entries::Model> {
        let entry = journal_entries::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(new.symbol.trim().to_uppercase()),
            direction: ActiveValue::Set(new.direction.as_str().to_string()),
            entry_price: ActiveValue::Set(new.entry_price),
            exit_price: ActiveValue::Set(new.exit_price),
            amount: ActiveValue::Set(new.amount),
            outcome: ActiveValue::Set(new.outcome.map(|o| o.as_str().to_string())),
            notes: ActiveValue::Set(new.notes),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        Ok(entry.insert(self.db.as_ref()).await?)
    }

    pub async fn update(&self, user_id: Uuid, id: i32, patch: JournalPatch) -> Result<Option<journal_entries::Model>> {
        let entry = journal_entries::Entity::find_by_id(id)
            .filter(journal_entries::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;
        let Some(entry) = entry else {
            return Ok(None);
        };

        let original = entry.clone();
        let mut update: journal_entries::ActiveModel = entry.into();
        if let Some(exit_price) = patch.exit_price {
            update.exit_price = ActiveValue::Set(Some(exit_price));
        }
        if let Some(amount) = patch.amount {
            update.amount = ActiveValue::Set(Some(amount));
        }
        if let Some(outcome) = patch.outcome {
            update.outcome = ActiveValue::Set(Some(outcome.as_str().to_string()));
        }
        if let Some(notes) = patch.notes {
            update.notes = ActiveValue::Set(Some(notes));
        }
        if !update.is_changed() {
            return Ok(Some(original));
        }
        Ok(Some(update.update(self.db.as_ref()).await?))
    }

    pub async fn delete(&self, user_id: Uuid, id: i32) -> Result<bool> {
        let result = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(id))
            .filter(journal_entries::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::*, ActiveValue, Order, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;

use crate::entity::price_alerts;
use crate::models::AlertCondition;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlert {
    pub symbol: String,
    pub target_price: f64,
    pub condition: AlertCondition,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertPatch {
    pub symbol: Option<String>,
    pub target_price: Option<f64>,
    pub condition: Option<AlertCondition>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct AlertRepository {
    db: Arc<DatabaseConnection>,
}

impl AlertRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<price_alerts::Model>> {
        let alerts = price_alerts::Entity::find()
            .filter(price_alerts::Column::UserId.eq(user_id))
            .order_by(price_alerts::Column::CreatedAt, Order::Desc)
            .order_by(price_alerts::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(alerts)
    }

    pub async fn find_for_user(&self, user_id: Uuid, id: i32) -> Result<Option<price_alerts::Model>> {
        let alert = price_alerts::Entity::find_by_id(id)
            .filter(price_alerts::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;
        Ok(alert)
    }

    pub async fn create(&self, user_id: Uuid, new: NewAlert) -> Result<price_alerts::Model> {
        let alert = price_alerts::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(new.symbol.trim().to_uppercase()),
            target_price: ActiveValue::Set(new.target_price),
            condition: ActiveValue::Set(new.condition.as_str().to_string()),
            is_active: ActiveValue::Set(true),
            triggered_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        Ok(alert.insert(self.db.as_ref()).await?)
    }

    pub async fn update(&self, user_id: Uuid, id: i32, patch: AlertPatch) -> Result<Option<price_alerts::Model>> {
        let Some(alert) = self.find_for_user(user_id, id).await? else {
            return Ok(None);
        };
        let original = alert.clone();
        let mut update: price_alerts::ActiveModel = alert.into();
        if let Some(symbol) = patch.symbol {
            update.symbol = ActiveValue::Set(symbol.trim().to_uppercase());
        }
        if let Some(target_price) = patch.target_price {
            update.target_price = ActiveValue::Set(target_price);
        }
        if let Some(condition) = patch.condition {
            update.condition = ActiveValue::Set(condition.as_str().to_string());
        }
        if let Some(is_active) = patch.is_active {
            update.is_active = ActiveValue::Set(is_active);
            // Re-arming clears the previous trigger.
            if is_active {
                update.triggered_at = ActiveValue::Set(None);
            }
        }
        if !update.is_changed() {
            return Ok(Some(original));
        }
        Ok(Some(update.update(self.db.as_ref()).await?))
    }

    pub async fn delete(&self, user_id: Uuid, id: i32) -> Result<bool> {
        let result = price_alerts::Entity::delete_many()
            .filter(price_alerts::Column::Id.eq(id))
            .filter(price_alerts::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Flip every active alert on `symbol` whose condition holds at `price`.
    /// Triggered alerts are deactivated; returns them in their new state.
    pub async fn trigger_matching(&self, symbol: &str, price: f64, at: DateTime<Utc>) -> Result<Vec<price_alerts::Model>> {
        let candidates = price_alerts::Entity::find()
            .filter(price_alerts::Column::Symbol.eq(symbol.trim().to_uppercase()))
            .filter(price_alerts::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await?;

        let mut triggered = Vec::new();
        for alert in candidates {
            let Some(condition) = AlertCondition::from_str(&alert.condition) else {
                tracing::warn!("Alert {} has unknown condition {:?}, skipping", alert.id, alert.condition);
                continue;
            };
            if !condition.is_met(alert.target_price, price) {
                continue;
            }
            let mut update: price_alerts::ActiveModel = alert.into();
            update.is_active = ActiveValue::Set(false);
            update.triggered_at = ActiveValue::Set(Some(at));
            triggered.push(update.update(self.db.as_ref()).await?);
        }
        Ok(triggered)
    }
}

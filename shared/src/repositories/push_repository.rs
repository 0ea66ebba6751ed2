use anyhow::Result;
use chrono::Utc;
use sea_orm::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entity::push_subscriptions;

/// Key material of a browser `PushSubscription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Clone)]
pub struct PushSubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PushSubscriptionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find(&self, user_id: Uuid, endpoint: &str) -> Result<Option<push_subscriptions::Model>> {
        let sub = push_subscriptions::Entity::find()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .filter(push_subscriptions::Column::Endpoint.eq(endpoint))
            .one(self.db.as_ref())
            .await?;
        Ok(sub)
    }

    /// Keyed by `(user_id, endpoint)`: a re-subscribe refreshes the keys.
    pub async fn upsert(&self, user_id: Uuid, endpoint: &str, keys: SubscriptionKeys) -> Result<push_subscriptions::Model> {
        let now = Utc::now();
        if let Some(existing) = self.find(user_id, endpoint).await? {
            let mut update: push_subscriptions::ActiveModel = existing.into();
            update.p256dh = ActiveValue::Set(keys.p256dh);
            update.auth = ActiveValue::Set(keys.auth);
            update.updated_at = ActiveValue::Set(now);
            return Ok(update.update(self.db.as_ref()).await?);
        }

        let sub = push_subscriptions::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            endpoint: ActiveValue::Set(endpoint.to_string()),
            p256dh: ActiveValue::Set(keys.p256dh),
            auth: ActiveValue::Set(keys.auth),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        Ok(sub.insert(self.db.as_ref()).await?)
    }

    pub async fn remove(&self, user_id: Uuid, endpoint: &str) -> Result<bool> {
        let result = push_subscriptions::Entity::delete_many()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .filter(push_subscriptions::Column::Endpoint.eq(endpoint))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn remove_by_id(&self, id: i32) -> Result<()> {
        push_subscriptions::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<push_subscriptions::Model>> {
        let subs = push_subscriptions::Entity::find()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?;
        Ok(subs)
    }

    pub async fn list_all(&self) -> Result<Vec<push_subscriptions::Model>> {
        let subs = push_subscriptions::Entity::find()
            .all(self.db.as_ref())
            .await?;
        Ok(subs)
    }
}

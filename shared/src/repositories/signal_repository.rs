use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::*, ActiveValue, Order, PaginatorTrait, QueryOrder, QuerySelect, SqlErr,
};
use std::sync::Arc;

use crate::entity::signals;
use crate::models::{NewSignal, SignalResult, SignalStats, SignalStatus};

/// Outcome of an insert keyed by the Telegram message id.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(signals::Model),
    Duplicate,
}

#[derive(Clone)]
pub struct SignalRepository {
    db: Arc<DatabaseConnection>,
}

impl SignalRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<signals::Model>> {
        let signal = signals::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(signal)
    }

    pub async fn find_by_telegram_message_id(&self, message_id: i64) -> Result<Option<signals::Model>> {
        let signal = signals::Entity::find()
            .filter(signals::Column::TelegramMessageId.eq(message_id))
            .one(self.db.as_ref())
            .await?;
        Ok(signal)
    }

    /// Insert unless a row for the same Telegram message already exists.
    /// A unique-key race with a concurrent insert is reported as a duplicate too.
    pub async fn insert_if_absent(&self, new: NewSignal) -> Result<InsertOutcome> {
        if self.find_by_telegram_message_id(new.telegram_message_id).await?.is_some() {
            return Ok(InsertOutcome::Duplicate);
        }

        let active = signals::ActiveModel {
            asset: ActiveValue::Set(new.asset),
            timeframe: ActiveValue::Set(new.timeframe),
            direction: ActiveValue::Set(new.direction.as_str().to_string()),
            raw_message: ActiveValue::Set(new.raw_message),
            telegram_message_id: ActiveValue::Set(new.telegram_message_id),
            chat_id: ActiveValue::Set(new.chat_id),
            entry_time: ActiveValue::Set(new.entry_time),
            status: ActiveValue::Set(SignalStatus::Pending.as_str().to_string()),
            result: ActiveValue::Set(None),
            failure_reason: ActiveValue::Set(None),
            received_at: ActiveValue::Set(new.received_at),
            executed_at: ActiveValue::Set(None),
            resolved_at: ActiveValue::Set(None),
            ..Default::default()
        };

        match active.insert(self.db.as_ref()).await {
            Ok(model) => Ok(InsertOutcome::Inserted(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unresolved signals received at or after `since`, most recent first.
    pub async fn find_unresolved_since(&self, since: DateTime<Utc>, limit: u64) -> Result<Vec<signals::Model>> {
        let rows = signals::Entity::find()
            .filter(signals::Column::Result.is_null())
            .filter(signals::Column::ReceivedAt.gte(since))
            .order_by(signals::Column::ReceivedAt, Order::Desc)
            .order_by(signals::Column::Id, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn set_result(&self, id: i32, result: SignalResult, resolved_at: DateTime<Utc>) -> Result<Option<signals::Model>> {
        let Some(signal) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let mut update: signals::ActiveModel = signal.into();
        update.result = ActiveValue::Set(Some(result.as_str().to_string()));
        update.resolved_at = ActiveValue::Set(Some(resolved_at));
        let updated = update.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }

    /// Pending signals, most recently received first.
    pub async fn find_pending(&self, limit: u64) -> Result<Vec<signals::Model>> {
        let rows = signals::Entity::find()
            .filter(signals::Column::Status.eq(SignalStatus::Pending.as_str()))
            .order_by(signals::Column::ReceivedAt, Order::Desc)
            .order_by(signals::Column::Id, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn mark_executed(&self, id: i32, executed_at: DateTime<Utc>) -> Result<Option<signals::Model>> {
        let Some(signal) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let mut update: signals::ActiveModel = signal.into();
        update.status = ActiveValue::Set(SignalStatus::Executed.as_str().to_string());
        update.executed_at = ActiveValue::Set(Some(executed_at));
        update.failure_reason = ActiveValue::Set(None);
        let updated = update.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }

    pub async fn mark_failed(&self, id: i32, reason: Option<String>) -> Result<Option<signals::Model>> {
        let Some(signal) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let mut update: signals::ActiveModel = signal.into();
        update.status = ActiveValue::Set(SignalStatus::Failed.as_str().to_string());
        update.failure_reason = ActiveValue::Set(reason);
        let updated = update.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }

    pub async fn list_recent(&self, status: Option<SignalStatus>, limit: u64) -> Result<Vec<signals::Model>> {
        let mut query = signals::Entity::find();
        if let Some(status) = status {
            query = query.filter(signals::Column::Status.eq(status.as_str()));
        }
        let rows = query
            .order_by(signals::Column::ReceivedAt, Order::Desc)
            .order_by(signals::Column::Id, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Counters over all signals, or over those received since `since`.
    pub async fn stats(&self, since: Option<DateTime<Utc>>) -> Result<SignalStats> {
        let base = || {
            let query = signals::Entity::find();
            match since {
                Some(since) => query.filter(signals::Column::ReceivedAt.gte(since)),
                None => query,
            }
        };
        let db = self.db.as_ref();

        let total = base().count(db).await?;
        let pending = base()
            .filter(signals::Column::Status.eq(SignalStatus::Pending.as_str()))
            .count(db)
            .await?;
        let executed = base()
            .filter(signals::Column::Status.eq(SignalStatus::Executed.as_str()))
            .count(db)
            .await?;
        let failed = base()
            .filter(signals::Column::Status.eq(SignalStatus::Failed.as_str()))
            .count(db)
            .await?;
        let wins = base()
            .filter(signals::Column::Result.is_in([
                SignalResult::Win.as_str(),
                SignalResult::Win1.as_str(),
                SignalResult::Win2.as_str(),
            ]))
            .count(db)
            .await?;
        let losses = base()
            .filter(signals::Column::Result.eq(SignalResult::Loss.as_str()))
            .count(db)
            .await?;
        let unresolved = base().filter(signals::Column::Result.is_null()).count(db).await?;

        Ok(SignalStats {
            total,
            pending,
            executed,
            failed,
            wins,
            losses,
            unresolved,
            win_rate: SignalStats::compute_win_rate(wins, losses),
        })
    }
}

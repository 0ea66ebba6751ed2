//! Paper trades and the virtual wallet they settle into

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::*, ActiveValue, ConnectionTrait, Order, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entity::{trades, wallets};
use crate::models::{profit_loss, Direction, TradeStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub amount: f64,
    /// Queue the trade as `pending` instead of opening it right away.
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedTrade {
    pub trade: trades::Model,
    pub wallet: wallets::Model,
}

#[derive(Debug, Clone)]
pub enum CloseOutcome {
    Closed(ClosedTrade),
    NotFound,
    AlreadyClosed,
}

#[derive(Clone)]
pub struct TradeRepository {
    db: Arc<DatabaseConnection>,
    initial_balance: f64,
}

impl TradeRepository {
    pub fn new(db: Arc<DatabaseConnection>, initial_balance: f64) -> Self {
        Self { db, initial_balance }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<trades::Model>> {
        let rows = trades::Entity::find()
            .filter(trades::Column::UserId.eq(user_id))
            .order_by(trades::Column::OpenedAt, Order::Desc)
            .order_by(trades::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn open(&self, user_id: Uuid, new: NewTrade) -> Result<trades::Model> {
        let status = if new.pending { TradeStatus::Pending } else { TradeStatus::Open };
        let trade = trades::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(new.symbol.trim().to_uppercase()),
            direction: ActiveValue::Set(new.direction.as_str().to_string()),
            entry_price: ActiveValue::Set(new.entry_price),
            exit_price: ActiveValue::Set(None),
            amount: ActiveValue::Set(new.amount),
            status: ActiveValue::Set(status.as_str().to_string()),
            profit_loss: ActiveValue::Set(None),
            opened_at: ActiveValue::Set(Utc::now()),
            closed_at: ActiveValue::Set(None),
            ..Default::default()
        };
        Ok(trade.insert(self.db.as_ref()).await?)
    }

    /// Close a trade at `exit_price` and credit its P&L to the wallet in one transaction.
    pub async fn close(&self, user_id: Uuid, id: i32, exit_price: f64, at: DateTime<Utc>) -> Result<CloseOutcome> {
        let txn = self.db.begin().await?;

        let trade = trades::Entity::find_by_id(id)
            .filter(trades::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let Some(trade) = trade else {
            return Ok(CloseOutcome::NotFound);
        };
        if trade.status == TradeStatus::Closed.as_str() {
            return Ok(CloseOutcome::AlreadyClosed);
        }

        let direction = Direction::from_str(&trade.direction)
            .ok_or_else(|| anyhow::anyhow!("Trade {} has unknown direction {}", trade.id, trade.direction))?;
        let pnl = profit_loss(direction, trade.entry_price, exit_price, trade.amount);

        let mut trade_update: trades::ActiveModel = trade.into();
        trade_update.exit_price = ActiveValue::Set(Some(exit_price));
        trade_update.profit_loss = ActiveValue::Set(Some(pnl));
        trade_update.status = ActiveValue::Set(TradeStatus::Closed.as_str().to_string());
        trade_update.closed_at = ActiveValue::Set(Some(at));
        let trade = trade_update.update(&txn).await?;

        let wallet = self.wallet_in(&txn, user_id).await?;
        let new_balance = wallet.balance + pnl;
        let mut wallet_update: wallets::ActiveModel = wallet.into();
        wallet_update.balance = ActiveValue::Set(new_balance);
        wallet_update.updated_at = ActiveValue::Set(at);
        let wallet = wallet_update.update(&txn).await?;

        txn.commit().await?;
        Ok(CloseOutcome::Closed(ClosedTrade { trade, wallet }))
    }

    pub async fn delete(&self, user_id: Uuid, id: i32) -> Result<bool> {
        let result = trades::Entity::delete_many()
            .filter(trades::Column::Id.eq(id))
            .filter(trades::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// The user's wallet, created with the configured starting balance on first access.
    pub async fn wallet(&self, user_id: Uuid) -> Result<wallets::Model> {
        self.wallet_in(self.db.as_ref(), user_id).await
    }

    pub async fn reset_wallet(&self, user_id: Uuid) -> Result<wallets::Model> {
        let wallet = self.wallet(user_id).await?;
        let initial = wallet.initial_balance;
        let mut update: wallets::ActiveModel = wallet.into();
        update.balance = ActiveValue::Set(initial);
        update.updated_at = ActiveValue::Set(Utc::now());
        Ok(update.update(self.db.as_ref()).await?)
    }

    async fn wallet_in<C: ConnectionTrait>(&self, conn: &C, user_id: Uuid) -> Result<wallets::Model> {
        if let Some(wallet) = wallets::Entity::find_by_id(user_id).one(conn).await? {
            return Ok(wallet);
        }
        let wallet = wallets::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            balance: ActiveValue::Set(self.initial_balance),
            initial_balance: ActiveValue::Set(self.initial_balance),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        Ok(wallet.insert(conn).await?)
    }
}

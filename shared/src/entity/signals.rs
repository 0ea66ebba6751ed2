//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "signals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub asset: String, // "EUR/USD", "EUR/USD OTC"
    pub timeframe: String, // "M1", "M5", "H1", "S30"
    pub direction: String, // "call" or "put"
    #[sea_orm(column_type = "Text")]
    pub raw_message: String,
    #[sea_orm(unique)]
    pub telegram_message_id: i64,
    pub chat_id: Option<i64>,
    pub entry_time: Option<DateTimeUtc>,
    pub status: String, // "pending", "executed", "failed"
    pub result: Option<String>, // "win", "win1", "win2", "loss"
    #[sea_orm(column_type = "Text", nullable)]
    pub failure_reason: Option<String>,
    pub received_at: DateTimeUtc,
    pub executed_at: Option<DateTimeUtc>,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

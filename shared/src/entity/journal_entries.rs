//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Uuid,
    pub symbol: String,
    pub direction: String, // "call" or "put"
    #[sea_orm(column_type = "Double")]
    pub entry_price: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub exit_price: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub amount: Option<f64>,
    pub outcome: Option<String>, // "win", "win1", "win2", "loss"
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

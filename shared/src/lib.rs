pub mod change_feed;
pub mod config;
pub mod database;
pub mod entity;
pub mod models;
pub mod push;
pub mod repositories;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
pub use config::{Config, IngestMode};
pub use database::{get_db_connection, sync_schema};
pub use models::*;
pub use push::{NotificationType, PushGateway, PushPayload};

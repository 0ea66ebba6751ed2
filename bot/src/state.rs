use chrono::Duration;
use sea_orm::DatabaseConnection;
use shared::repositories::SignalRepository;
use shared::{get_db_connection, ChangeFeed, Config, PushGateway};
use std::sync::Arc;

use crate::services::ingest::{IngestService, IngestSettings};

pub type HandlerResult = Result<(), anyhow::Error>;

#[derive(Clone)]
pub struct AppState {
    pub bot_name: String,
    pub locale: String,
    pub webhook_secret: Option<String>,
    pub db: Arc<DatabaseConnection>,
    pub signals: SignalRepository,
    pub ingest: IngestService,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let db = get_db_connection(&config.database_url).await?;
        tracing::info!("Connected to database successfully");

        let feed = ChangeFeed::connect(&config.redis_url).await;
        let push = PushGateway::new(config.push_gateway_url.clone());
        if !push.is_enabled() {
            tracing::warn!("PUSH_GATEWAY_URL not set, push notifications disabled");
        }

        Ok(Self::build(config, Arc::new(db), push, feed))
    }

    /// Wire the state over an existing connection.
    pub fn build(config: &Config, db: Arc<DatabaseConnection>, push: PushGateway, feed: ChangeFeed) -> Self {
        let settings = IngestSettings {
            timezone: config.signal_timezone,
            match_window: Duration::minutes(config.result_match_window_minutes),
            locale: config.default_locale.clone(),
        };
        AppState {
            bot_name: config.bot_name.clone(),
            locale: config.default_locale.clone(),
            webhook_secret: config.webhook_secret.clone(),
            signals: SignalRepository::new(db.clone()),
            ingest: IngestService::new(db.clone(), settings, push, feed),
            db,
        }
    }
}

use anyhow::Result;
use relay::{server, HttpBrokerTab, RelaySettings, SignalRelay, SignalStore};
use shared::repositories::SignalRepository;
use shared::{get_db_connection, ChangeFeed, Config};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting signal relay...");

    let config = Config::from_env()?;
    let db = Arc::new(get_db_connection(&config.database_url).await?);
    info!("Connected to database");

    let feed = ChangeFeed::connect(&config.redis_url).await;
    let store = SignalStore::new(SignalRepository::new(db), feed);

    let broker = HttpBrokerTab::new(config.broker_bridge_url.clone());
    if config.broker_bridge_url.is_none() {
        warn!("BROKER_BRIDGE_URL not set, signals will not be forwarded");
    }

    let (handle, worker) = SignalRelay::new(store, broker, RelaySettings::from_config(&config)).spawn();

    let listener = tokio::net::TcpListener::bind(&config.relay_addr).await?;
    info!("Relay listening on http://{}/message", config.relay_addr);
    axum::serve(listener, server::router(handle)).await?;

    worker.abort();
    Ok(())
}

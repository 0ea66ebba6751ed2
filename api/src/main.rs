use anyhow::Result;
use api::state::AppState;
use shared::{get_db_connection, ChangeFeed, Config, PushGateway};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting signal desk API server...");

    let config = Config::from_env()?;
    let db = get_db_connection(&config.database_url).await?;
    info!("Connected to database");

    let feed = ChangeFeed::connect(&config.redis_url).await;
    if !feed.is_enabled() {
        warn!("Realtime limited to this process");
    }
    let push = PushGateway::new(config.push_gateway_url.clone());
    if !push.is_enabled() {
        warn!("PUSH_GATEWAY_URL not set, push notifications disabled");
    }

    let state = AppState::new(&config, Arc::new(db), push, feed.clone());

    if feed.is_enabled() {
        let changes = state.changes.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = feed.forward_to(changes.clone()).await {
                    error!("Change feed subscription failed: {}", e);
                }
                warn!("Change feed disconnected, resubscribing in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&config.api_addr).await?;
    info!("API server listening on http://{}", config.api_addr);
    axum::serve(listener, api::app(state)).await?;

    Ok(())
}

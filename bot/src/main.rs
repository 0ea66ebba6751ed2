use anyhow::{anyhow, Result};
use bot::commands::{handle_channel_message, handle_command, Command};
use bot::state::AppState;
use bot::webhook;
use shared::{Config, IngestMode};
use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};
use tracing_subscriber::EnvFilter;

fn schema() -> UpdateHandler<anyhow::Error> {
    let command_handler = teloxide::filter_command::<Command, _>().endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::endpoint(handle_channel_message));

    dptree::entry()
        .branch(message_handler)
        .branch(Update::filter_channel_post().endpoint(handle_channel_message))
        .branch(Update::filter_edited_channel_post().endpoint(handle_channel_message))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting {} ingress in {:?} mode...", config.bot_name, config.ingest_mode);

    let app_state = Arc::new(AppState::new(&config).await?);
    tracing::info!("AppState initialized");

    match config.ingest_mode {
        IngestMode::Webhook => {
            let listener = tokio::net::TcpListener::bind(&config.bot_addr).await?;
            tracing::info!("Webhook receiver listening on http://{}/telegram/webhook", config.bot_addr);
            axum::serve(listener, webhook::router(app_state)).await?;
        }
        IngestMode::Polling => {
            let token = config
                .bot_token
                .as_deref()
                .ok_or_else(|| anyhow!("BOT_TOKEN is required when INGEST_MODE=polling"))?;
            let bot = Bot::new(token);

            let mut dispatcher = Dispatcher::builder(bot, schema())
                .dependencies(dptree::deps![app_state.clone()])
                .enable_ctrlc_handler()
                .build();

            tracing::info!("Bot is running and waiting for updates...");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

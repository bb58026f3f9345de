use anyhow::Result;
use ruzh_translate_bot::config::{Config, UpdateMode};
use ruzh_translate_bot::server::{self, AppState};
use ruzh_translate_bot::telegram::{self, TelegramClient};
use ruzh_translate_bot::translate::{provider, Pipeline};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ruzh_translate_bot=info".parse()?),
        )
        .init();

    info!("Starting Telegram RU↔ZH translate bot");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Environment: {}, update mode: {:?}",
        config.environment, config.telegram_mode
    );

    let http_client = provider::http_client(config.http_timeout)?;
    let pipeline = Arc::new(Pipeline::from_config(&config, http_client.clone()));
    let telegram = Arc::new(TelegramClient::new(
        http_client,
        &config.telegram_api_url,
        &config.telegram_bot_token,
    ));

    let mode = config.telegram_mode;
    let state = Arc::new(AppState {
        config,
        pipeline: pipeline.clone(),
        telegram: telegram.clone(),
    });

    let http = tokio::spawn(server::serve(state));

    let polling = async {
        match mode {
            UpdateMode::Polling => telegram::poll_updates(telegram, pipeline).await,
            // Updates arrive through the webhook route
            UpdateMode::Webhook => std::future::pending().await,
        }
    };

    tokio::select! {
        result = http => {
            match result {
                Ok(Ok(())) => info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    error!("HTTP server failed: {:#}", e);
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        result = polling => {
            if let Err(e) = result {
                error!("Update polling failed: {:#}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Bot stopped");
    Ok(())
}

//! Smoke test binary - runs sample messages through the live translation pipeline
//!
//! Nothing is sent to Telegram; replies are printed instead.
//!
//! Usage:
//!   cargo run --bin smoke                      # Run the built-in samples
//!   cargo run --bin smoke -- "Доброе утро"     # Translate your own messages
//!
//! Required environment variables:
//! - DEEPL_API_KEY
//!
//! Optional:
//! - DEEPL_API_URL (defaults to the free or pro endpoint by key suffix)
//! - LIBRETRANSLATE_URL (defaults to https://libretranslate.de/translate)
//! - LIBRETRANSLATE_API_KEY
//! - TRANSLATION_MAX_ATTEMPTS (defaults to 3)
//! - HTTP_TIMEOUT_SECS (defaults to 15)

use anyhow::{Context, Result};
use ruzh_translate_bot::config::{Config, UpdateMode};
use ruzh_translate_bot::translate::{provider, Pipeline, PipelineOutcome};
use std::time::Duration;
use tracing::info;

const SAMPLES: [&str; 4] = [
    "Привет, как дела?",
    "你好，你好吗？",
    "Hello, how are you?",
    "   ",
];

/// Minimal config for the smoke run (no Telegram required)
struct SmokeConfig {
    deepl_api_key: String,
    deepl_api_url: Option<String>,
    libretranslate_url: String,
    libretranslate_api_key: Option<String>,
    translation_max_attempts: u32,
    http_timeout: Duration,
}

impl SmokeConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            deepl_api_key: std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY not set")?,
            deepl_api_url: std::env::var("DEEPL_API_URL").ok(),
            libretranslate_url: std::env::var("LIBRETRANSLATE_URL")
                .unwrap_or_else(|_| "https://libretranslate.de/translate".to_string()),
            libretranslate_api_key: std::env::var("LIBRETRANSLATE_API_KEY").ok(),
            translation_max_attempts: std::env::var("TRANSLATION_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
        })
    }

    /// Convert to the full Config struct (with dummy values for unused fields)
    fn to_full_config(&self) -> Config {
        let deepl_api_url = self.deepl_api_url.clone().unwrap_or_else(|| {
            if self.deepl_api_key.ends_with(":fx") {
                "https://api-free.deepl.com/v2/translate".to_string()
            } else {
                "https://api.deepl.com/v2/translate".to_string()
            }
        });

        Config {
            environment: "smoke".to_string(),
            telegram_bot_token: "unused".to_string(),
            telegram_api_url: "unused".to_string(),
            telegram_mode: UpdateMode::Polling,
            telegram_webhook_secret: None,
            deepl_api_key: self.deepl_api_key.clone(),
            deepl_api_url,
            libretranslate_url: self.libretranslate_url.clone(),
            libretranslate_api_key: self.libretranslate_api_key.clone(),
            max_concurrent_translations: 1,
            translation_max_attempts: self.translation_max_attempts.max(1),
            cache_ttl: Duration::from_secs(300),
            http_timeout: self.http_timeout,
            port: 0,
        }
    }
}

fn describe(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Translated(routed) => format!(
            "{} (provider: {}, detected: {}, cached: {})",
            routed.reply_text(),
            routed.result.provider,
            routed.result.detected_source_lang,
            routed.result.served_from_cache
        ),
        PipelineOutcome::Skipped => "(no reply)".to_string(),
        PipelineOutcome::Busy(e) => format!("busy reply ({})", e),
        PipelineOutcome::Failed(e) => format!("(no reply, failed: {})", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ruzh_translate_bot=info".parse()?),
        )
        .init();

    info!("Loading configuration...");
    let config = SmokeConfig::from_env()?.to_full_config();

    let client = provider::http_client(config.http_timeout)?;
    let pipeline = Pipeline::from_config(&config, client);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let inputs: Vec<&str> = if args.is_empty() {
        SAMPLES.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    println!();
    for input in inputs {
        let outcome = pipeline.translate(input).await;
        println!("  input:  {:?}", input);
        println!("  reply:  {}", describe(&outcome));
        println!();
    }

    let report = pipeline.metrics().report();
    println!("--- Metrics ---");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEEPL_FREE_API_URL: &str = "https://api-free.deepl.com/v2/translate";
const DEEPL_PRO_API_URL: &str = "https://api.deepl.com/v2/translate";

/// How the bot receives updates from Telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Long polling via getUpdates (works without a public URL)
    Polling,
    /// Telegram pushes updates to `/telegram/webhook`
    Webhook,
}

impl UpdateMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "polling" | "poll" => Ok(UpdateMode::Polling),
            "webhook" => Ok(UpdateMode::Webhook),
            other => bail!("Invalid TELEGRAM_MODE '{}'. Expected 'polling' or 'webhook'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,

    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub telegram_mode: UpdateMode,
    pub telegram_webhook_secret: Option<String>,

    // DeepL (primary provider)
    pub deepl_api_key: String,
    pub deepl_api_url: String,

    // LibreTranslate (fallback provider)
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,

    // Translation pipeline
    pub max_concurrent_translations: usize,
    pub translation_max_attempts: u32,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,

    // HTTP server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let deepl_api_key = std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY not set")?;

        // Free-tier keys carry a ":fx" suffix and only work against the free endpoint
        let deepl_api_url = std::env::var("DEEPL_API_URL").unwrap_or_else(|_| {
            if deepl_api_key.ends_with(":fx") {
                DEEPL_FREE_API_URL.to_string()
            } else {
                DEEPL_PRO_API_URL.to_string()
            }
        });

        let telegram_mode = match std::env::var("TELEGRAM_MODE") {
            Ok(value) => UpdateMode::parse(&value)?,
            Err(_) => UpdateMode::Polling,
        };

        Ok(Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            // Telegram
            telegram_bot_token: std::env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            telegram_mode,
            telegram_webhook_secret: std::env::var("TELEGRAM_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),

            // DeepL
            deepl_api_key,
            deepl_api_url,

            // LibreTranslate
            libretranslate_url: std::env::var("LIBRETRANSLATE_URL")
                .unwrap_or_else(|_| "https://libretranslate.de/translate".to_string()),
            libretranslate_api_key: std::env::var("LIBRETRANSLATE_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),

            // Translation pipeline
            max_concurrent_translations: std::env::var("MAX_CONCURRENT_TRANSLATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1usize)
                .max(1),
            translation_max_attempts: std::env::var("TRANSLATION_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3u32)
                .max(1),
            cache_ttl: Duration::from_secs(
                std::env::var("CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),

            // HTTP server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        })
    }
}

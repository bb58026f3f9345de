use crate::replies;
use crate::retry::{with_retry_advice, RetryAdvice, RetryConfig};
use crate::translate::Pipeline;
use anyhow::{bail, Context, Result};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Seconds Telegram holds a getUpdates request open when there is nothing new
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed getUpdates call before polling again
const POLL_ERROR_DELAY: Duration = Duration::from_secs(3);

// Telegram update types
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    // Only presence matters for voice and audio
    pub voice: Option<IgnoredAny>,
    pub audio: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub r#type: String,
}

impl Chat {
    /// Channels are ignored; private chats and groups are served.
    pub fn is_supported(&self) -> bool {
        matches!(self.r#type.as_str(), "private" | "group" | "supergroup")
    }
}

/// What an inbound message asks the bot to do
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<'a> {
    Start,
    Voice,
    Text(&'a str),
    Ignored,
}

impl Message {
    pub fn classify(&self) -> Inbound<'_> {
        if self.voice.is_some() || self.audio.is_some() {
            return Inbound::Voice;
        }

        let Some(text) = self.text.as_deref() else {
            return Inbound::Ignored;
        };

        // "/start", "/start@SomeBot" and deep links like "/start payload"
        let command = text.split_whitespace().next().unwrap_or("");
        if command == "/start" || command.starts_with("/start@") {
            return Inbound::Start;
        }

        Inbound::Text(text)
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct DeleteWebhookRequest {
    drop_pending_updates: bool,
}

/// Envelope every Bot API method answers with
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Telegram API error ({status}): {description}")]
    Api {
        status: u16,
        description: String,
        retry_after: Option<u64>,
    },
}

impl TelegramError {
    /// Rate limits, 5xx and network failures are retried; other API errors are final.
    pub fn retry_advice(&self) -> RetryAdvice {
        match self {
            TelegramError::Transport(_) => RetryAdvice::Backoff,
            TelegramError::Api {
                status: 429,
                retry_after: Some(secs),
                ..
            } => RetryAdvice::After(Duration::from_secs(*secs)),
            TelegramError::Api { status, .. } if *status == 429 || *status >= 500 => {
                RetryAdvice::Backoff
            }
            TelegramError::Api { .. } => RetryAdvice::GiveUp,
        }
    }
}

/// Thin Bot API client. The token only ever lives in `api_base`.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    retry: RetryConfig,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, api_url: &str, bot_token: &str) -> Self {
        Self {
            client,
            api_base: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
            retry: RetryConfig::telegram_api(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn call<P, T>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}/{}", self.api_base, method))
            .json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Strip URLs from transport errors: they contain the bot token
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();

        let body: ApiResponse<T> = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::Api {
                    status: status.as_u16(),
                    description: status.to_string(),
                    retry_after: None,
                })
            }
            Err(e) => return Err(TelegramError::Transport(e.without_url())),
        };

        if !body.ok {
            return Err(TelegramError::Api {
                status: body.error_code.unwrap_or(status.as_u16()),
                description: body
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
                retry_after: body.parameters.and_then(|p| p.retry_after),
            });
        }

        body.result.ok_or_else(|| TelegramError::Api {
            status: status.as_u16(),
            description: format!("{} response missing result", method),
            retry_after: None,
        })
    }

    /// Send a plain-text message (no parse mode, so translations need no escaping)
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id,
        };

        with_retry_advice(
            &self.retry,
            "Telegram sendMessage",
            || self.call::<_, IgnoredAny>("sendMessage", &request, None),
            TelegramError::retry_advice,
        )
        .await
        .with_context(|| format!("Failed to send message to chat {}", chat_id))?;

        Ok(())
    }

    /// Long-poll for updates newer than `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };

        // The HTTP timeout must outlast the long-poll window
        let http_timeout = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &request, Some(http_timeout)).await
    }

    /// Remove any registered webhook so getUpdates is allowed
    pub async fn delete_webhook(&self) -> Result<()> {
        let request = DeleteWebhookRequest {
            drop_pending_updates: false,
        };

        with_retry_advice(
            &RetryConfig::startup(),
            "Telegram deleteWebhook",
            || self.call::<_, bool>("deleteWebhook", &request, None),
            TelegramError::retry_advice,
        )
        .await
        .context("Failed to delete Telegram webhook")?;

        Ok(())
    }
}

/// Handle one update: at most one reply per inbound message.
pub async fn handle_update(telegram: &TelegramClient, pipeline: &Pipeline, update: Update) -> Result<()> {
    let message = match update.message {
        Some(msg) => msg,
        None => return Ok(()), // Not a message update, ignore
    };

    if !message.chat.is_supported() {
        debug!(
            "Ignoring message from unsupported chat type '{}'",
            message.chat.r#type
        );
        return Ok(());
    }

    let chat_id = message.chat.id;

    match message.classify() {
        Inbound::Start => {
            info!("Received /start from {}", chat_id);
            telegram.send_message(chat_id, replies::GREETING, None).await?;
        }
        Inbound::Voice => {
            info!("Received voice message from {}", chat_id);
            telegram
                .send_message(chat_id, replies::VOICE_PENDING, Some(message.message_id))
                .await?;
        }
        Inbound::Text(text) => {
            debug!("Received message from {}: {}", chat_id, text);
            let outcome = pipeline.translate(text).await;
            if let Some(reply) = outcome.reply_text() {
                telegram
                    .send_message(chat_id, &reply, Some(message.message_id))
                    .await?;
            }
        }
        Inbound::Ignored => {}
    }

    Ok(())
}

/// Handle an update on its own task so slow translations don't block intake
pub fn spawn_update(telegram: Arc<TelegramClient>, pipeline: Arc<Pipeline>, update: Update) {
    tokio::spawn(async move {
        let update_id = update.update_id;
        if let Err(e) = handle_update(&telegram, &pipeline, update).await {
            error!("Failed to handle update {}: {:#}", update_id, e);
        }
    });
}

/// Long-polling loop. Only returns on a non-retryable API error.
pub async fn poll_updates(telegram: Arc<TelegramClient>, pipeline: Arc<Pipeline>) -> Result<()> {
    telegram.delete_webhook().await?;
    info!("Polling Telegram for updates");

    let mut offset: Option<i64> = None;
    loop {
        match telegram.get_updates(offset, LONG_POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    spawn_update(telegram.clone(), pipeline.clone(), update);
                }
            }
            Err(e) => {
                let wait = match e.retry_advice() {
                    RetryAdvice::GiveUp => bail!("Telegram polling stopped: {}", e),
                    RetryAdvice::After(wait) => wait,
                    RetryAdvice::Backoff => POLL_ERROR_DELAY,
                };
                warn!("getUpdates failed ({}), retrying in {:?}", e, wait);
                sleep(wait).await;
            }
        }
    }
}

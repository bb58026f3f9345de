//! Liveness and webhook HTTP server.
//!
//! # Endpoints
//!
//! - `GET /health`: liveness probe for the hosting platform
//! - `GET /`: short description of the running service
//! - `GET /stats`: translation cache and provider counters
//! - `POST /telegram/webhook`: Telegram update intake (webhook mode only)

use crate::config::{Config, UpdateMode};
use crate::security::{verify_webhook_secret, WEBHOOK_SECRET_HEADER};
use crate::telegram::{self, TelegramClient, Update};
use crate::translate::{MetricsReport, Pipeline};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for all route handlers.
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
    pub telegram: Arc<TelegramClient>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
    bot: &'static str,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    message: &'static str,
    status: &'static str,
    features: [&'static str; 2],
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/", get(info_handler))
        .route("/stats", get(stats_handler));

    if state.config.telegram_mode == UpdateMode::Webhook {
        app = app.route("/telegram/webhook", post(webhook_handler));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until the process exits.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on port {}", state.config.port))?;

    serve_on(listener, state).await
}

pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP server listening on {}", addr);
    }

    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "telegram-ru-zh-bot",
        timestamp: Utc::now().to_rfc3339(),
        bot: "running",
    })
}

async fn info_handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Telegram RU↔ZH Translate Bot is running",
        status: "active",
        features: ["russian-chinese-translation", "voice-support-planned"],
    })
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<MetricsReport> {
    Json(state.pipeline.metrics().report())
}

/// Accepts the update and hands it off; Telegram gets its 200 right away.
async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verify_webhook_secret(state.config.telegram_webhook_secret.as_deref(), provided) {
        warn!("Rejected webhook call with missing or invalid secret");
        return StatusCode::UNAUTHORIZED;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Malformed webhook payload: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    telegram::spawn_update(state.telegram.clone(), state.pipeline.clone(), update);
    StatusCode::OK
}

//! Telegram bot that translates between Russian and Chinese.
//!
//! Inbound chat text goes through [`translate::Pipeline`]; replies are sent
//! with [`telegram::TelegramClient`]. Updates arrive either by long polling or
//! through the webhook route served by [`server`].

pub mod config;
pub mod replies;
pub mod retry;
pub mod security;
pub mod server;
pub mod telegram;
pub mod translate;

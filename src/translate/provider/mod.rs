//! Translation providers.
//!
//! A provider turns `(text, target)` into translated text plus whatever source
//! language it detected. Failures are classified into a
//! [`ProviderErrorKind`](super::ProviderErrorKind) by the provider itself so
//! the retry logic never has to look at message text.

mod deepl;
mod libre;

pub use deepl::DeepLProvider;
pub use libre::LibreTranslateProvider;

use super::{Language, ProviderError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Output of a single successful provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTranslation {
    pub translated_text: String,
    pub detected_source_lang: String,
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<ProviderTranslation, ProviderError>;
}

/// Shared HTTP client for all providers.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

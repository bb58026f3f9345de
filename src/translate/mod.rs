//! Resilient translation pipeline.
//!
//! Everything between "a chat message arrived" and "here is the reply text"
//! lives in this module. The pieces are explicitly constructed and owned by
//! [`Pipeline`]; nothing here is a global.
//!
//! # Architecture
//!
//! - `language`: the two supported languages, translation directions and the
//!   script heuristic used when live detection is unavailable
//! - `cache`: TTL-bounded `(text, target) -> result` store
//! - `limiter`: FIFO admission gate bounding concurrent upstream work
//! - `provider`: the `TranslationProvider` capability with DeepL (primary) and
//!   LibreTranslate (fallback) implementations
//! - `failover`: retry controller with linear + quota-aware backoff and
//!   failover to the secondary provider
//! - `router`: decides ru→zh, zh→ru or no-op from the detected source
//! - `pipeline`: the single entry point used by the chat integration
//! - `metrics`: lock-free counters for cache and provider activity
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = Pipeline::from_config(&config, http_client);
//! match pipeline.translate("Привет, как дела?").await.reply_text() {
//!     Some(reply) => send(chat_id, &reply).await?,
//!     None => {}
//! }
//! ```

mod cache;
mod error;
mod failover;
mod language;
mod limiter;
mod metrics;
mod pipeline;
pub mod provider;
mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheKey, TranslationCache, DEFAULT_CACHE_TTL};
pub use error::{PipelineError, ProviderError, ProviderErrorKind};
pub use failover::{AttemptOutcome, BackoffPolicy, NextStep, ProviderAttempt, RetryController};
pub use language::{sniff_script, DetectedLanguage, Direction, Language};
pub use limiter::AdmissionLimiter;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use provider::{ProviderTranslation, TranslationProvider};
pub use router::{LanguageRouter, RoutedTranslation};

use std::time::Duration;
use tokio::time::Instant;

/// One request for a translation into a specific target language.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub target: Language,
    pub requested_at: Instant,
}

impl TranslationRequest {
    pub fn new(text: &str, target: Language) -> Self {
        Self {
            text: text.to_string(),
            target,
            requested_at: Instant::now(),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.text, self.target)
    }

    /// Time since the request was created.
    pub fn age(&self) -> Duration {
        self.requested_at.elapsed()
    }
}

/// A finished translation as seen by callers of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
    /// Lower-cased language code reported by the provider, or `"auto"` when
    /// the provider does not detect languages.
    pub detected_source_lang: String,
    /// Name of the provider that produced the text.
    pub provider: &'static str,
    pub served_from_cache: bool,
}

impl TranslationResult {
    pub(crate) fn fresh(translation: ProviderTranslation, provider: &'static str) -> Self {
        Self {
            translated_text: translation.translated_text,
            detected_source_lang: translation.detected_source_lang,
            provider,
            served_from_cache: false,
        }
    }
}

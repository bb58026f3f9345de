use super::provider::{DeepLProvider, LibreTranslateProvider};
use super::{
    AdmissionLimiter, BackoffPolicy, LanguageRouter, PipelineError, RetryController,
    RoutedTranslation, TranslationCache, TranslationMetrics,
};
use crate::config::Config;
use crate::replies;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What became of one inbound message.
#[derive(Debug)]
pub enum PipelineOutcome {
    Translated(RoutedTranslation),
    /// Blank input or a language we don't translate. Nothing is sent.
    Skipped,
    /// Both providers failed and at least one was out of quota. The user is
    /// told to try again later.
    Busy(PipelineError),
    /// Both providers failed for some other reason. Logged, nothing is sent.
    Failed(PipelineError),
}

impl PipelineOutcome {
    /// Whether the user gets a reply for this outcome
    pub fn delivered(&self) -> bool {
        matches!(self, PipelineOutcome::Translated(_) | PipelineOutcome::Busy(_))
    }

    /// The single reply to send, if any
    pub fn reply_text(&self) -> Option<String> {
        match self {
            PipelineOutcome::Translated(routed) => Some(routed.reply_text()),
            PipelineOutcome::Busy(_) => Some(replies::BUSY.to_string()),
            PipelineOutcome::Skipped | PipelineOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            PipelineOutcome::Busy(e) | PipelineOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Entry point for chat text: admission, routing, retries and failover.
pub struct Pipeline {
    limiter: AdmissionLimiter,
    router: LanguageRouter,
}

impl Pipeline {
    pub fn new(limiter: AdmissionLimiter, router: LanguageRouter) -> Self {
        Self { limiter, router }
    }

    /// Wire up DeepL as primary and LibreTranslate as fallback from `config`.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let primary = DeepLProvider::new(
            client.clone(),
            &config.deepl_api_url,
            &config.deepl_api_key,
        );
        let fallback = LibreTranslateProvider::new(
            client,
            &config.libretranslate_url,
            config.libretranslate_api_key.clone(),
        );

        let controller = RetryController::new(
            Arc::new(primary),
            Arc::new(fallback),
            TranslationCache::new(config.cache_ttl),
            BackoffPolicy::new(config.translation_max_attempts),
            Arc::new(TranslationMetrics::new()),
        );

        info!(
            "Translation pipeline ready (concurrency: {}, attempts: {}, cache TTL: {:?})",
            config.max_concurrent_translations, config.translation_max_attempts, config.cache_ttl
        );

        Self::new(
            AdmissionLimiter::new(config.max_concurrent_translations),
            LanguageRouter::new(controller),
        )
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        self.router.controller().metrics()
    }

    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    /// Translate one chat message. Never fails: every error is folded into
    /// the outcome.
    pub async fn translate(&self, text: &str) -> PipelineOutcome {
        let text = text.trim();
        if text.is_empty() {
            return PipelineOutcome::Skipped;
        }

        let routed = self.limiter.run(|| self.router.route(text)).await;

        match routed {
            Ok(Some(translation)) => PipelineOutcome::Translated(translation),
            Ok(None) => PipelineOutcome::Skipped,
            Err(e) if e.is_quota_exhausted() => {
                warn!("Translation capacity exhausted: {}", e);
                PipelineOutcome::Busy(e)
            }
            Err(e) => {
                error!("Translation failed: {}", e);
                PipelineOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::test_support::{detecting_primary, StubProvider};
    use crate::translate::{Direction, ProviderErrorKind};
    use std::time::Duration;

    fn pipeline(
        primary: Arc<StubProvider>,
        fallback: Arc<StubProvider>,
        max_concurrent: usize,
    ) -> Pipeline {
        let controller = RetryController::new(
            primary,
            fallback,
            TranslationCache::default(),
            BackoffPolicy::default(),
            Arc::new(TranslationMetrics::new()),
        );
        Pipeline::new(
            AdmissionLimiter::new(max_concurrent),
            LanguageRouter::new(controller),
        )
    }

    fn unused_fallback() -> Arc<StubProvider> {
        Arc::new(StubProvider::failing("libretranslate", ProviderErrorKind::Other))
    }

    // ==================== Input Handling ====================

    #[tokio::test]
    async fn test_blank_input_is_skipped_without_upstream_call() {
        let primary = Arc::new(detecting_primary());
        let pipeline = pipeline(primary.clone(), unused_fallback(), 1);

        for input in ["", "   ", "\n\t "] {
            let outcome = pipeline.translate(input).await;
            assert!(matches!(outcome, PipelineOutcome::Skipped));
            assert!(outcome.reply_text().is_none());
        }

        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_input_is_trimmed_before_translation() {
        let primary = Arc::new(detecting_primary());
        let pipeline = pipeline(primary.clone(), unused_fallback(), 1);

        pipeline.translate("  Привет  ").await;
        let outcome = pipeline.translate("Привет").await;

        // Same key after trimming: second run is a cache hit
        assert_eq!(primary.calls(), 1);
        match outcome {
            PipelineOutcome::Translated(routed) => assert!(routed.result.served_from_cache),
            other => panic!("Expected translation, got {:?}", other),
        }
    }

    // ==================== Literal Scenarios ====================

    #[tokio::test]
    async fn test_reply_texts() {
        let pipeline = pipeline(Arc::new(detecting_primary()), unused_fallback(), 1);

        let outcome = pipeline.translate("Привет, как дела?").await;
        assert!(outcome.delivered());
        assert_eq!(outcome.reply_text().as_deref(), Some("🇷🇺→🇨🇳 你好，你好吗？"));

        let outcome = pipeline.translate("你好，你好吗？").await;
        assert_eq!(outcome.reply_text().as_deref(), Some("🇨🇳→🇷🇺 Привет, как дела?"));

        let outcome = pipeline.translate("Hello, how are you?").await;
        assert!(matches!(outcome, PipelineOutcome::Skipped));
        assert!(!outcome.delivered());
    }

    // ==================== Failure Classification ====================

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhaustion_is_busy() {
        let primary = Arc::new(StubProvider::failing("deepl", ProviderErrorKind::Quota));
        let fallback = Arc::new(StubProvider::failing("libretranslate", ProviderErrorKind::Network));
        let pipeline = pipeline(primary, fallback, 1);

        let outcome = pipeline.translate("Привет").await;

        assert!(matches!(outcome, PipelineOutcome::Busy(_)));
        assert_eq!(outcome.reply_text().as_deref(), Some(replies::BUSY));
        assert!(outcome.error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_are_silent() {
        let primary = Arc::new(StubProvider::failing("deepl", ProviderErrorKind::Other));
        let fallback = Arc::new(StubProvider::failing("libretranslate", ProviderErrorKind::Network));
        let pipeline = pipeline(primary, fallback, 1);

        let outcome = pipeline.translate("Привет").await;

        assert!(matches!(outcome, PipelineOutcome::Failed(_)));
        assert!(outcome.reply_text().is_none());
        assert!(!outcome.delivered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_quota_after_primary_rejection_is_silent() {
        let primary = Arc::new(StubProvider::failing("deepl", ProviderErrorKind::Other));
        let fallback = Arc::new(StubProvider::failing("libretranslate", ProviderErrorKind::Quota));
        let pipeline = pipeline(primary, fallback.clone(), 1);

        let outcome = pipeline.translate("Привет").await;

        assert_eq!(fallback.calls(), 1);
        assert!(matches!(outcome, PipelineOutcome::Failed(_)));
        assert!(outcome.reply_text().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_language_gets_no_busy_reply() {
        let primary = Arc::new(StubProvider::failing("deepl", ProviderErrorKind::Quota));
        let fallback = Arc::new(StubProvider::failing("libretranslate", ProviderErrorKind::Quota));
        let pipeline = pipeline(primary.clone(), fallback.clone(), 1);

        let start = tokio::time::Instant::now();
        let outcome = pipeline.translate("Hello, how are you?").await;

        assert!(matches!(outcome, PipelineOutcome::Skipped));
        assert!(outcome.reply_text().is_none());
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
        // No quota backoff while holding the admission gate
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(pipeline.limiter().in_flight(), 0);
    }

    // ==================== Admission ====================

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_one_never_overlaps_provider_calls() {
        let primary = Arc::new(detecting_primary().with_latency(Duration::from_millis(200)));
        let pipeline = Arc::new(pipeline(primary.clone(), unused_fallback(), 1));

        let texts = ["Привет", "Как дела?", "你好", "谢谢", "Спасибо"];
        let handles: Vec<_> = texts
            .iter()
            .map(|text| {
                let pipeline = pipeline.clone();
                let text = text.to_string();
                tokio::spawn(async move { pipeline.translate(&text).await })
            })
            .collect();

        for handle in handles {
            let outcome = handle.await.expect("Task should not panic");
            assert!(outcome.delivered());
        }

        assert_eq!(primary.calls(), texts.len());
        assert_eq!(primary.peak_in_flight(), 1);
        assert_eq!(pipeline.limiter().in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_higher_concurrency_allows_overlap() {
        let primary = Arc::new(detecting_primary().with_latency(Duration::from_millis(200)));
        let pipeline = Arc::new(pipeline(primary.clone(), unused_fallback(), 3));

        let handles: Vec<_> = ["Один", "Два", "Три"]
            .iter()
            .map(|text| {
                let pipeline = pipeline.clone();
                let text = text.to_string();
                tokio::spawn(async move { pipeline.translate(&text).await })
            })
            .collect();

        for handle in handles {
            handle.await.expect("Task should not panic");
        }

        assert!(primary.peak_in_flight() > 1);
        assert!(primary.peak_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_direction_of_translated_outcome() {
        let pipeline = pipeline(Arc::new(detecting_primary()), unused_fallback(), 1);

        match pipeline.translate("你好").await {
            PipelineOutcome::Translated(routed) => {
                assert_eq!(routed.direction, Direction::ChineseToRussian)
            }
            other => panic!("Expected translation, got {:?}", other),
        }
    }
}

//! Scripted providers for unit tests of the retry, routing and pipeline layers.

use super::{Language, ProviderError, ProviderErrorKind, ProviderTranslation, TranslationProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

type Responder =
    Box<dyn Fn(&str, Language, usize) -> Result<ProviderTranslation, ProviderError> + Send + Sync>;

/// Provider whose answers come from a closure `(text, target, call_index)`.
/// Tracks call count, call times and peak concurrency.
pub struct StubProvider {
    name: &'static str,
    responder: Responder,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    targets: Mutex<Vec<Language>>,
}

impl StubProvider {
    pub fn new<F>(name: &'static str, responder: F) -> Self
    where
        F: Fn(&str, Language, usize) -> Result<ProviderTranslation, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name,
            responder: Box::new(responder),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            targets: Mutex::new(Vec::new()),
        }
    }

    /// Always succeeds with `translated`, reporting `detected` as the source.
    pub fn answering(name: &'static str, translated: &'static str, detected: &'static str) -> Self {
        Self::new(name, move |_, _, _| Ok(translation(translated, detected)))
    }

    /// Always fails with the given kind.
    pub fn failing(name: &'static str, kind: ProviderErrorKind) -> Self {
        Self::new(name, move |_, _, _| Err(ProviderError::new(name, kind, "scripted failure")))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn targets(&self) -> Vec<Language> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for StubProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<ProviderTranslation, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        self.targets.lock().unwrap().push(target);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.responder)(text, target, index)
    }
}

pub fn translation(text: &str, detected: &str) -> ProviderTranslation {
    ProviderTranslation {
        translated_text: text.to_string(),
        detected_source_lang: detected.to_string(),
    }
}

/// A DeepL-like stub: Russian input is reported as "ru", CJK input as "zh",
/// anything else as "en". Translations are tagged with the target code.
pub fn detecting_primary() -> StubProvider {
    StubProvider::new("deepl", |text, target, _| {
        let detected = match super::sniff_script(text) {
            Some(lang) => lang.code(),
            None => "en",
        };
        let translated = match target {
            Language::Chinese => "你好，你好吗？",
            Language::Russian => "Привет, как дела?",
        };
        Ok(translation(translated, detected))
    })
}

//! Translation metrics: cache effectiveness and provider health.
//!
//! Counters are plain atomics so reading them (e.g. from `/stats`) never
//! waits on the admission limiter or the cache lock.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    primary_calls: AtomicUsize,
    primary_failures: AtomicUsize,
    fallback_calls: AtomicUsize,
    fallback_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_primary_call(&self) {
        self.primary_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_primary_failure(&self) {
        self.primary_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_call(&self) {
        self.fallback_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_failure(&self) {
        self.fallback_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn primary_calls(&self) -> usize {
        self.primary_calls.load(Ordering::Relaxed)
    }

    pub fn primary_failures(&self) -> usize {
        self.primary_failures.load(Ordering::Relaxed)
    }

    pub fn fallback_calls(&self) -> usize {
        self.fallback_calls.load(Ordering::Relaxed)
    }

    pub fn fallback_failures(&self) -> usize {
        self.fallback_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters plus derived rates.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.primary_calls();
        let failures = self.primary_failures();
        let primary_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            primary_calls: calls,
            primary_failures: failures,
            primary_success_rate,
            fallback_calls: self.fallback_calls(),
            fallback_failures: self.fallback_failures(),
        }
    }
}

/// Point-in-time view of [`TranslationMetrics`], served as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Percentage (0-100)
    pub cache_hit_rate: f64,
    pub primary_calls: usize,
    pub primary_failures: usize,
    /// Percentage (0-100)
    pub primary_success_rate: f64,
    pub fallback_calls: usize,
    pub fallback_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = TranslationMetrics::new();
        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.cache_misses(), 0);
        assert_eq!(metrics.primary_calls(), 0);
        assert_eq!(metrics.fallback_calls(), 0);
    }

    #[test]
    fn test_record_each_counter() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_primary_call();
        metrics.record_primary_failure();
        metrics.record_fallback_call();
        metrics.record_fallback_failure();

        assert_eq!(metrics.cache_hits(), 1);
        assert_eq!(metrics.cache_misses(), 2);
        assert_eq!(metrics.primary_calls(), 1);
        assert_eq!(metrics.primary_failures(), 1);
        assert_eq!(metrics.fallback_calls(), 1);
        assert_eq!(metrics.fallback_failures(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.primary_success_rate, 0.0);
    }

    #[test]
    fn test_report_rates() {
        let metrics = TranslationMetrics::new();
        for _ in 0..3 {
            metrics.record_cache_hit();
        }
        metrics.record_cache_miss();
        for _ in 0..4 {
            metrics.record_primary_call();
        }
        metrics.record_primary_failure();

        let report = metrics.report();
        assert!((report.cache_hit_rate - 75.0).abs() < f64::EPSILON);
        assert!((report.primary_success_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_fallback_call();

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["fallback_calls"], 1);
        assert!(json.get("cache_hit_rate").is_some());
    }
}

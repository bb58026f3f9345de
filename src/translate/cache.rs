//! In-memory translation cache with TTL.
//!
//! Key: trimmed text (case preserved) + target language.
//! Expired entries read as misses and are overwritten by the next store;
//! there is no background reaper and no size bound.

use super::{Language, TranslationResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    target: Language,
}

impl CacheKey {
    pub fn new(text: &str, target: Language) -> Self {
        Self {
            text: text.trim().to_string(),
            target,
        }
    }
}

struct CacheEntry {
    result: TranslationResult,
    stored_at: Instant,
}

pub struct TranslationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a cached translation. Returns None if absent or older than the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<TranslationResult> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;

        if entry.stored_at.elapsed() > self.ttl {
            debug!("Cache entry for {:?} expired", key.target);
            return None;
        }

        let mut result = entry.result.clone();
        result.served_from_cache = true;
        Some(result)
    }

    /// Store a result, replacing whatever was there.
    pub fn put(&self, key: CacheKey, result: TranslationResult) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

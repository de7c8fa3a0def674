//! TTL cache for classification results.
//!
//! Deliberately not an LRU: a fresh read returns the stored value without
//! touching its deadline, and expiry is lazy. The first `get` that
//! observes an entry past its TTL deletes it and reports a miss; nothing
//! else evicts. `update` unconditionally overwrites and resets the
//! deadline.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::metrics::get_metrics;

/// Default time-to-live for cached classifications: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry<V> {
    stored_at: Instant,
    value: V,
}

/// TTL map from cache key to classification payload.
pub struct ClassificationCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ClassificationCache<V> {
    /// Create a cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a key. Expired entries are deleted on this read and
    /// reported as a miss; fresh entries keep their original deadline.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let metrics = get_metrics();

        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                metrics.cache_hits_total.inc();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            metrics.cache_entries.set(entries.len() as i64);
        }
        metrics.cache_misses_total.inc();
        None
    }

    /// Insert or overwrite a key, resetting its deadline.
    pub fn update(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock();
        entries.insert(
            key.into(),
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
        get_metrics().cache_entries.set(entries.len() as i64);
    }

    /// Number of entries currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> Default for ClassificationCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

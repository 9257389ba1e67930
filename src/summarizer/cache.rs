use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;
use lru::LruCache;

use super::prompt::RunSearch;
use crate::report::SummaryResult;

/// Identifies one summarisation: the same node of the same build, asked with
/// the same retrieval mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub build_number: String,
    pub node_id: String,
    pub run_search: RunSearch,
}

impl SummaryKey {
    pub fn new(build_number: &str, node_id: &str, run_search: RunSearch) -> Self {
        Self {
            build_number: build_number.to_string(),
            node_id: node_id.to_string(),
            run_search,
        }
    }
}

struct CachedSummary {
    summary: SummaryResult,
    inserted_at: Instant,
}

/// Summary cache bounded by entry count and age.
///
/// Entries older than the TTL are never returned. When an insert would push
/// the cache past capacity, the least recently used entry is evicted. The lock
/// is never held across an await point, so two concurrent misses on the same
/// key both summarise and the later insert wins.
pub struct SummaryCache {
    cache: Mutex<LruCache<SummaryKey, CachedSummary>>,
    ttl: Duration,
}

impl SummaryCache {
    /// Creates an empty cache. A zero capacity is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &SummaryKey) -> Option<SummaryResult> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: SummaryKey, summary: SummaryResult) {
        self.insert_at(key, summary, Instant::now());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<SummaryKey, CachedSummary>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_at(&self, key: &SummaryKey, now: Instant) -> Option<SummaryResult> {
        let mut cache = self.lock();
        let entry = cache.get(key)?;
        if now.saturating_duration_since(entry.inserted_at) < self.ttl {
            return Some(entry.summary.clone());
        }

        debug!("Cached summary for {key:?} expired");
        cache.pop(key);
        None
    }

    fn insert_at(&self, key: SummaryKey, summary: SummaryResult, now: Instant) {
        let mut cache = self.lock();

        let expired: Vec<SummaryKey> = cache
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.inserted_at) >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for stale in expired {
            cache.pop(&stale);
        }

        let entry = CachedSummary {
            summary,
            inserted_at: now,
        };
        if let Some((evicted, _)) = cache.push(key.clone(), entry) {
            if evicted != key {
                debug!("Evicted cached summary for {evicted:?}");
            }
        }
    }
}

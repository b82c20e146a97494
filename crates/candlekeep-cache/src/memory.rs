//! Bounded in-memory tier with LRU eviction and lazy TTL expiry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use candlekeep_types::{CacheKey, CandleSeries};
use chrono::TimeDelta;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::{CacheEntry, Clock, SystemClock};

/// Counters describing memory tier activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Reads served from the tier.
    pub hits: u64,
    /// Reads that found nothing, including expired entries.
    pub misses: u64,
    /// Entries dropped to make room for new ones.
    pub evictions: u64,
    /// Entries dropped because their TTL ran out.
    pub expirations: u64,
    /// Entries currently held.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Thread-safe LRU store of series snapshots.
///
/// Recency is refreshed by both reads and writes. Entries past their expiry
/// are treated as absent on read and removed at that point. Every mutation,
/// counters included, happens under a single lock.
#[derive(Debug)]
pub struct MemoryTier {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryTier {
    /// Creates a tier holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Creates a tier reading time from `clock`.
    #[must_use]
    pub fn with_clock(capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            clock,
        }
    }

    /// Returns the cached series for `key`, if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CandleSeries>> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                inner.hits += 1;
                tracing::debug!(%key, "memory hit");
                return Some(Arc::clone(&entry.series));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            inner.expirations += 1;
            tracing::debug!(%key, "memory entry expired");
        }
        inner.misses += 1;
        None
    }

    /// Stores `series` under `key` for `ttl`, evicting the least recently
    /// used entry if the tier is full.
    pub fn put(&self, key: CacheKey, series: Arc<CandleSeries>, ttl: TimeDelta) {
        let entry = CacheEntry::new(key.clone(), series, self.clock.now(), ttl);
        let mut inner = self.inner.lock();
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
            if evicted != key {
                inner.evictions += 1;
                tracing::debug!(%evicted, inserted = %key, "evicted least recently used entry");
            }
        }
    }

    /// Removes the entry for `key`, returning whether one was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.pop(key).is_some()
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Returns the number of entries held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the tier holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Returns a consistent snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        MemoryStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            size: inner.entries.len(),
            capacity: inner.entries.cap().get(),
        }
    }
}

//! Cache Statistics Module
//!
//! Tracks per-cache counters and the snapshot reported to status endpoints.

use serde::Serialize;

// == Cache Stats ==
/// Running counters for one TTL cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key absent or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries purged after their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Ratio ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    ///
    /// Advisory only.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Snapshot ==
/// Point-in-time statistics of a TTL cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtlCacheStats {
    /// Non-expired entries at snapshot time
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// hits / (hits + misses)
    pub hit_ratio: f64,
    #[serde(flatten)]
    pub counters: CacheStats,
}

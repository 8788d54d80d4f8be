//! TTL Cache Module
//!
//! Bounded key/value store combining HashMap storage with LRU tracking and
//! TTL expiration, guarded by a single mutex per instance.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheStats, LruTracker, TtlCacheStats};
use crate::error::{CacheError, Result};

/// Longest TTL accepted for any entry.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

// == Inner State ==
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<V> Inner<V> {
    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }
}

// == TTL Cache ==
/// Thread-safe cache with per-entry TTL and least-recently-used eviction.
///
/// The lock is held only for in-memory bookkeeping. Values are cloned out on
/// a hit, so large values should be stored behind an `Arc`.
///
/// Concurrent `set` calls on the same key are last-write-wins.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    max_size: usize,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a new TtlCache with specified capacity and default TTL.
    ///
    /// A zero capacity, or a TTL that is zero or above [`MAX_TTL`], is
    /// rejected with [`CacheError::InvalidConfig`].
    pub fn new(max_size: usize, default_ttl: Duration) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be positive".to_string(),
            ));
        }
        check_ttl("default_ttl", default_ttl)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            max_size,
            default_ttl,
        })
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most recently used.
    ///
    /// Absent and expired keys are misses; an expired entry is removed on the
    /// way out. A miss leaves the order of other keys untouched.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            None => {
                inner.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            inner.remove_entry(key);
            inner.stats.record_expirations(1);
            inner.stats.record_miss();
            return None;
        }

        inner.stats.record_hit();
        inner.lru.touch(key);
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a value under the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.insert(key.into(), value, self.default_ttl);
    }

    /// Stores a value with an explicit TTL, checked like the default TTL.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        check_ttl("ttl", ttl)?;
        self.insert(key.into(), value, ttl);
        Ok(())
    }

    /// Stores a value under the default TTL only if `condition` holds.
    ///
    /// The condition is evaluated under the cache lock, so it is ordered
    /// against concurrent `clear` calls. Returns whether the value was stored.
    pub fn set_if<F>(&self, key: impl Into<String>, value: V, condition: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut inner = self.inner.lock();
        if !condition() {
            return false;
        }
        self.insert_locked(&mut inner, key.into(), value, self.default_ttl);
        true
    }

    fn insert(&self, key: String, value: V, ttl: Duration) {
        let mut inner = self.inner.lock();
        self.insert_locked(&mut inner, key, value, ttl);
    }

    fn insert_locked(&self, inner: &mut Inner<V>, key: String, value: V, ttl: Duration) {
        // Expired entries go first so they never cost a live entry its slot
        inner.purge_expired(Instant::now());

        // Overwrites reuse their slot; new keys evict until there is room
        if !inner.entries.contains_key(&key) {
            while inner.entries.len() >= self.max_size {
                match inner.lru.evict_oldest() {
                    Some(evicted_key) => {
                        inner.entries.remove(&evicted_key);
                        inner.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        inner.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        inner.lru.touch(&key);
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove_entry(key)
    }

    /// Removes every entry unconditionally.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired(Instant::now())
    }

    /// Removes every live key matching `predicate` under one lock acquisition.
    pub fn remove_matching<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut inner = self.inner.lock();
        let matching: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        matching
            .iter()
            .filter(|key| inner.remove_entry(key))
            .count()
    }

    /// Returns whether a live entry exists, without promoting it.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Live keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.lru.iter_oldest_first().cloned().collect()
    }

    // == Size ==
    /// Returns the number of non-expired entries, sweeping expired ones first.
    pub fn size(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Stats ==
    /// Returns a statistics snapshot, sweeping expired entries first.
    pub fn stats(&self) -> TtlCacheStats {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        TtlCacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            hit_ratio: inner.stats.hit_ratio(),
            counters: inner.stats,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

fn check_ttl(name: &str, ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidConfig(format!("{} must be positive", name)));
    }
    if ttl > MAX_TTL || Instant::now().checked_add(ttl).is_none() {
        return Err(CacheError::InvalidConfig(format!(
            "{} must not exceed {} seconds",
            name,
            MAX_TTL.as_secs()
        )));
    }
    Ok(())
}

//! Cache Manager Module
//!
//! Owns the data, query and aggregation caches and layers get-or-compute,
//! file-change invalidation and pattern invalidation on top of them.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{cache_key, CallArgs, TtlCache, TtlCacheStats};
use crate::config::{CacheConfig, RoleConfig};
use crate::error::Result;

/// Type-erased value stored in every role.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

// == Cache Role ==
/// The three independent named caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheRole {
    /// Raw loaded dataset
    Data,
    /// Per-request computed results
    Query,
    /// Expensive grouped computations
    Aggregation,
}

impl CacheRole {
    pub const ALL: [CacheRole; 3] = [CacheRole::Data, CacheRole::Query, CacheRole::Aggregation];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheRole::Data => "data",
            CacheRole::Query => "query",
            CacheRole::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for CacheRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Manager Stats ==
/// Statistics across all roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerStats {
    pub data: TtlCacheStats,
    pub query: TtlCacheStats,
    pub aggregation: TtlCacheStats,
    /// Sum of the three role sizes
    pub total_entries: usize,
}

// == Cache Manager ==
/// Multi-level cache shared by request handlers and the warming service.
///
/// Every role has its own lock and the file watch map has another. No lock
/// is held while a loader or compute function runs, so concurrent misses on
/// the same key may each compute; the last store wins.
///
/// Clearing the query and aggregation roles (a data-file cascade or
/// [`clear_all`](Self::clear_all)) advances a generation counter. A query or
/// aggregation result whose compute started before the clear is returned to
/// its caller but not stored.
pub struct CacheManager {
    data: TtlCache<CachedValue>,
    query: TtlCache<CachedValue>,
    aggregation: TtlCache<CachedValue>,
    /// Last observed modification time per data file
    file_mtimes: Mutex<HashMap<PathBuf, SystemTime>>,
    /// Bumped before the derived roles are cleared
    generation: AtomicU64,
}

impl CacheManager {
    // == Constructors ==
    /// Creates a manager with explicit per-role policies.
    pub fn new(data: RoleConfig, query: RoleConfig, aggregation: RoleConfig) -> Result<Self> {
        let manager = Self {
            data: TtlCache::new(data.max_size, data.ttl())?,
            query: TtlCache::new(query.max_size, query.ttl())?,
            aggregation: TtlCache::new(aggregation.max_size, aggregation.ttl())?,
            file_mtimes: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        };

        info!(
            data_size = data.max_size,
            query_size = query.max_size,
            aggregation_size = aggregation.max_size,
            "CacheManager initialized with multi-level caching"
        );
        Ok(manager)
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.data, config.query, config.aggregation)
    }

    /// Direct access to one role's cache.
    pub fn cache(&self, role: CacheRole) -> &TtlCache<CachedValue> {
        match role {
            CacheRole::Data => &self.data,
            CacheRole::Query => &self.query,
            CacheRole::Aggregation => &self.aggregation,
        }
    }

    // == File Watch ==
    /// Returns true when `path` changed since it was last observed.
    ///
    /// A path seen for the first time counts as modified. When the file
    /// cannot be stat'ed it is assumed modified and the recorded time is kept.
    pub fn check_file_modified(&self, path: &Path) -> bool {
        let mtime = match fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not check file modification time");
                return true;
            }
        };

        let mut mtimes = self.file_mtimes.lock();
        match mtimes.get(path) {
            Some(last) if mtime <= *last => false,
            _ => {
                mtimes.insert(path.to_path_buf(), mtime);
                true
            }
        }
    }

    /// Clears every role when `path` changed. Returns whether it did.
    pub fn invalidate_on_data_change(&self, path: &Path) -> bool {
        let modified = self.check_file_modified(path);
        if modified {
            self.clear_all();
        }
        modified
    }

    // == Data ==
    /// Loads the dataset at `path` through the data cache.
    ///
    /// A changed file drops its data entry and clears the query and
    /// aggregation roles before the lookup.
    pub fn get_data<T, E, F>(&self, path: &Path, loader: F) -> std::result::Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Path) -> std::result::Result<T, E>,
    {
        let key = data_key(path);

        if self.check_file_modified(path) {
            info!(path = %path.display(), "Data file modified, invalidating dependent caches");
            self.data.delete(&key);
            self.clear_derived();
        }

        self.get_or_compute(CacheRole::Data, Ok(key), || loader(path))
    }

    // == Query ==
    /// Get-or-compute against the query role.
    pub fn get_query_result<T, E, F>(
        &self,
        name: &str,
        args: &CallArgs,
        compute: F,
    ) -> std::result::Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.get_or_compute(CacheRole::Query, cache_key(name, args), compute)
    }

    // == Aggregation ==
    /// Get-or-compute against the aggregation role.
    pub fn get_aggregation_result<T, E, F>(
        &self,
        name: &str,
        args: &CallArgs,
        compute: F,
    ) -> std::result::Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.get_or_compute(CacheRole::Aggregation, cache_key(name, args), compute)
    }

    // == Invalidation ==
    /// Deletes every key containing `pattern` in any role.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let invalidated: usize = CacheRole::ALL
            .iter()
            .map(|role| self.cache(*role).remove_matching(|key| key.contains(pattern)))
            .sum();

        info!(pattern, invalidated, "Invalidated cache entries matching pattern");
        invalidated
    }

    pub fn clear_all(&self) {
        self.data.clear();
        self.clear_derived();
        info!("All caches cleared");
    }

    fn clear_derived(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.query.clear();
        self.aggregation.clear();
    }

    // == Get-or-compute ==
    fn get_or_compute<T, E, F>(
        &self,
        role: CacheRole,
        key: Result<String>,
        compute: F,
    ) -> std::result::Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let key = match key {
            Ok(key) => key,
            Err(err) => {
                warn!(role = %role, error = %err, "Could not derive cache key, computing uncached");
                return compute().map(Arc::new);
            }
        };

        let cache = self.cache(role);
        if let Some(cached) = cache.get(&key) {
            match cached.downcast::<T>() {
                Ok(value) => {
                    debug!(role = %role, key = %key, "Cache hit");
                    return Ok(value);
                }
                Err(_) => {
                    warn!(role = %role, key = %key, "Cached value has unexpected type, recomputing");
                }
            }
        } else {
            debug!(role = %role, key = %key, "Cache miss, computing");
        }

        let generation = self.generation.load(Ordering::SeqCst);

        // Runs without any cache lock held; errors are returned before anything is stored
        let value = Arc::new(compute()?);

        if role == CacheRole::Data {
            cache.set(key, value.clone() as CachedValue);
        } else {
            let stored = cache.set_if(key, value.clone() as CachedValue, || {
                self.generation.load(Ordering::SeqCst) == generation
            });
            if !stored {
                debug!(role = %role, "Caches cleared during compute, result not stored");
            }
        }
        Ok(value)
    }

    /// Sweeps expired entries from every role.
    pub fn purge_expired(&self) -> usize {
        CacheRole::ALL
            .iter()
            .map(|role| self.cache(*role).purge_expired())
            .sum()
    }

    // == Stats ==
    pub fn get_stats(&self) -> ManagerStats {
        let data = self.data.stats();
        let query = self.query.stats();
        let aggregation = self.aggregation.stats();
        let total_entries = data.size + query.size + aggregation.size;

        ManagerStats {
            data,
            query,
            aggregation,
            total_entries,
        }
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("data", &self.data.size())
            .field("query", &self.query.size())
            .field("aggregation", &self.aggregation.size())
            .finish()
    }
}

fn data_key(path: &Path) -> String {
    format!("data:{}", path.display())
}

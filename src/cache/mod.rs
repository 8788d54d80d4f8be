//! Cache Module
//!
//! Provides the TTL/LRU cache primitive, key derivation and the multi-level
//! cache manager built on top of them.

mod entry;
mod key;
mod lru;
mod manager;
mod stats;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{cache_key, ArgValue, CallArgs};
pub use lru::LruTracker;
pub use manager::{CacheManager, CacheRole, CachedValue, ManagerStats};
pub use stats::{CacheStats, TtlCacheStats};
pub use ttl::{TtlCache, MAX_TTL};

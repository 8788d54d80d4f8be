//! STR Analytics Cache - multi-level caching for a short-term-rental analytics API
//!
//! Provides a TTL/LRU cache primitive, a cache manager layering data, query
//! and aggregation caches with file-change invalidation, and a warming
//! service that pre-populates common queries.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod telemetry;
pub mod warming;

pub use cache::{CacheManager, CacheRole, CallArgs, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, spawn_warming_task};
pub use warming::{WarmingOutcome, WarmingService, WarmingStatus};

//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from every cache role.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns a background task that periodically removes expired entries.
///
/// Expired entries are already invisible to readers; the sweep only returns
/// their memory between writes.
///
/// # Arguments
/// * `cache` - Shared cache manager
/// * `cleanup_interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheManager::from_config(&config)?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<CacheManager>, cleanup_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = cleanup_interval.as_secs_f64(),
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(cleanup_interval).await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

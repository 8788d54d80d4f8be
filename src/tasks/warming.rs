//! Scheduled Warming Task
//!
//! Warms the caches at startup and again on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::warming::{WarmingOutcome, WarmingService};

/// Upper bound on the wait after a failed cycle
const RETRY_AFTER_FAILURE: Duration = Duration::from_secs(3600);

/// Spawns the warming loop: one cycle immediately, then one per
/// `config.warming_interval` seconds.
///
/// Returns None without spawning anything when warming is disabled, and an
/// [`InvalidConfig`](crate::error::CacheError::InvalidConfig) error when the
/// configuration does not validate.
pub fn spawn_warming_task(
    service: Arc<WarmingService>,
    config: &CacheConfig,
) -> Result<Option<JoinHandle<()>>> {
    config.validate()?;
    if !config.enable_warming {
        info!("Cache warming disabled by configuration");
        return Ok(None);
    }

    let data_file = config.data_file_path.clone();
    let interval = Duration::from_secs(config.warming_interval);

    Ok(Some(tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Scheduling cache warming"
        );

        loop {
            let wait = match service.warm_all_caches(data_file.clone()).await {
                WarmingOutcome::Completed(report) => {
                    info!(
                        duration_secs = report.duration_secs,
                        "Scheduled cache warming completed"
                    );
                    interval
                }
                WarmingOutcome::AlreadyWarming { .. } => {
                    warn!("Scheduled cache warming skipped, a cycle is already running");
                    interval
                }
                WarmingOutcome::Failed { message, .. } => {
                    error!(%message, "Scheduled cache warming failed");
                    interval.min(RETRY_AFTER_FAILURE)
                }
            };

            tokio::time::sleep(wait).await;
        }
    })))
}

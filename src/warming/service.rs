//! Cache Warming Service
//!
//! Pre-populates the data, query and aggregation roles with the computations
//! users request most, so first requests hit the cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::analytics::{Analytics, CachedAnalytics};
use crate::cache::{CacheManager, ManagerStats};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::models::{self, Dataset, DatasetSummary, DateRange};
use crate::warming::ranges::{common_date_ranges, last_30_days};

/// Loads the backing dataset from disk.
pub type DataLoader = Arc<dyn Fn(&Path) -> anyhow::Result<Dataset> + Send + Sync>;

// == Reports ==
/// Result of a completed warming cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmingReport {
    pub duration_secs: f64,
    pub data_cache: bool,
    pub query_caches: BTreeMap<String, bool>,
    pub date_ranges: BTreeMap<String, bool>,
    pub cache_stats: ManagerStats,
}

/// Outcome of a [`WarmingService::warm_all_caches`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarmingOutcome {
    Completed(WarmingReport),
    Failed { message: String, duration_secs: f64 },
    AlreadyWarming { message: String },
}

impl WarmingOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WarmingOutcome::Completed(_))
    }
}

/// Snapshot served by status endpoints; safe to take mid-cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmingStatus {
    pub is_warming: bool,
    pub last_warming_time: Option<DateTime<Utc>>,
    pub last_results: Option<WarmingReport>,
    pub cache_stats: ManagerStats,
}

#[derive(Debug, Default)]
struct LastRun {
    finished_at: Option<DateTime<Utc>>,
    report: Option<WarmingReport>,
}

// == Warming Service ==
/// Runs warming cycles against a shared [`CacheManager`].
///
/// At most one cycle runs at a time; a second request while one is in
/// flight returns [`WarmingOutcome::AlreadyWarming`] immediately.
pub struct WarmingService {
    analytics: CachedAnalytics,
    loader: DataLoader,
    is_warming: AtomicBool,
    last_run: RwLock<LastRun>,
}

impl WarmingService {
    // == Constructor ==
    /// Creates a service that loads data with [`models::load_and_validate`].
    pub fn new(cache: Arc<CacheManager>, analytics: Arc<dyn Analytics>) -> Self {
        Self {
            analytics: CachedAnalytics::new(cache, analytics),
            loader: Arc::new(load_from_disk),
            is_warming: AtomicBool::new(false),
            last_run: RwLock::new(LastRun::default()),
        }
    }

    /// Replaces the dataset loader.
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Path) -> anyhow::Result<Dataset> + Send + Sync + 'static,
    {
        self.loader = Arc::new(loader);
        self
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        self.analytics.cache()
    }

    pub fn analytics(&self) -> &CachedAnalytics {
        &self.analytics
    }

    // == Data ==
    /// Loads the dataset through the data cache. Failures are logged and
    /// reported as `false`.
    pub fn warm_data_cache(&self, path: &Path) -> bool {
        self.load_data(path).is_ok()
    }

    fn load_data(&self, path: &Path) -> anyhow::Result<Arc<Dataset>> {
        info!("Warming data cache...");
        let loader = Arc::clone(&self.loader);
        match self.cache().get_data(path, |p| loader(p)) {
            Ok(data) => {
                let summary = DatasetSummary::of(&data);
                info!(
                    reservations = summary.reservations,
                    properties = summary.properties,
                    reviews = summary.reviews,
                    maintenance_blocks = summary.maintenance_blocks,
                    "Data cache warmed"
                );
                Ok(data)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Failed to warm data cache");
                Err(err)
            }
        }
    }

    // == Queries ==
    /// Warms the standard queries for the last 30 days and for the full dataset.
    pub fn warm_query_caches(&self, data: &Dataset) -> BTreeMap<String, bool> {
        self.warm_query_caches_at(data, Local::now().date_naive())
    }

    pub fn warm_query_caches_at(&self, data: &Dataset, today: NaiveDate) -> BTreeMap<String, bool> {
        let recent = last_30_days(today);
        let mut results = BTreeMap::new();

        info!("Warming revenue timeline cache...");
        results.insert(
            "revenue_timeline".to_string(),
            record("revenue_timeline", self.analytics.revenue_timeline(data, &recent)),
        );

        info!("Warming property revenue summary cache...");
        results.insert(
            "property_revenue".to_string(),
            record(
                "property_revenue",
                self.analytics.property_revenue_summary(data, &recent),
            ),
        );

        info!("Warming lost income cache...");
        results.insert(
            "lost_income".to_string(),
            record("lost_income", self.analytics.lost_income_summary(data, &recent)),
        );

        info!("Warming full dataset caches...");
        results.insert(
            "full_dataset".to_string(),
            self.warm_range("full_dataset", data, &DateRange::unbounded()),
        );

        results
    }

    // == Date Ranges ==
    /// Warms every common date range; one range failing leaves the others alone.
    pub fn warm_common_date_ranges(&self, data: &Dataset) -> BTreeMap<String, bool> {
        self.warm_common_date_ranges_at(data, Local::now().date_naive())
    }

    pub fn warm_common_date_ranges_at(
        &self,
        data: &Dataset,
        today: NaiveDate,
    ) -> BTreeMap<String, bool> {
        common_date_ranges(today)
            .into_iter()
            .map(|named| {
                info!(range = named.name, "Warming cache for date range");
                (
                    named.name.to_string(),
                    self.warm_range(named.name, data, &named.range),
                )
            })
            .collect()
    }

    /// Timeline, property revenue and lost income for one range.
    fn warm_range(&self, name: &str, data: &Dataset, range: &DateRange) -> bool {
        let outcome = self
            .analytics
            .revenue_timeline(data, range)
            .and_then(|_| self.analytics.property_revenue_summary(data, range))
            .and_then(|_| self.analytics.lost_income_summary(data, range));
        record(name, outcome)
    }

    // == Full Cycle ==
    /// Runs data, query and date-range warming in order on the blocking pool.
    ///
    /// A failed data load aborts the cycle; every other failure is recorded
    /// per task.
    pub async fn warm_all_caches(self: &Arc<Self>, path: impl Into<PathBuf>) -> WarmingOutcome {
        let guard = match WarmingGuard::acquire(self) {
            Some(guard) => guard,
            None => {
                warn!("Cache warming already in progress");
                return WarmingOutcome::AlreadyWarming {
                    message: "Cache warming already in progress".to_string(),
                };
            }
        };

        let path = path.into();
        let service = Arc::clone(self);
        let started = Instant::now();

        // The guard travels with the work so the flag stays set until the
        // cycle really ends, even if this future is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            service.run_cycle(&path)
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = CacheError::Internal(format!("Cache warming task failed: {}", err));
                error!(error = %err, "Cache warming task failed");
                WarmingOutcome::Failed {
                    message: err.to_string(),
                    duration_secs: started.elapsed().as_secs_f64(),
                }
            }
        }
    }

    fn run_cycle(&self, path: &Path) -> WarmingOutcome {
        let started = Instant::now();
        info!(path = %path.display(), "Starting comprehensive cache warming...");

        let data = match self.load_data(path) {
            Ok(data) => data,
            Err(err) => {
                return WarmingOutcome::Failed {
                    message: format!("Failed to warm data cache: {}", err),
                    duration_secs: started.elapsed().as_secs_f64(),
                };
            }
        };

        let today = Local::now().date_naive();
        let query_caches = self.warm_query_caches_at(&data, today);
        let date_ranges = self.warm_common_date_ranges_at(&data, today);

        let report = WarmingReport {
            duration_secs: started.elapsed().as_secs_f64(),
            data_cache: true,
            query_caches,
            date_ranges,
            cache_stats: self.cache().get_stats(),
        };

        {
            let mut last_run = self.last_run.write();
            last_run.finished_at = Some(Utc::now());
            last_run.report = Some(report.clone());
        }

        info!(
            duration_secs = report.duration_secs,
            total_entries = report.cache_stats.total_entries,
            "Cache warming completed"
        );
        WarmingOutcome::Completed(report)
    }

    // == Status ==
    pub fn is_warming(&self) -> bool {
        self.is_warming.load(Ordering::SeqCst)
    }

    pub fn get_warming_status(&self) -> WarmingStatus {
        let last_run = self.last_run.read();
        WarmingStatus {
            is_warming: self.is_warming(),
            last_warming_time: last_run.finished_at,
            last_results: last_run.report.clone(),
            cache_stats: self.cache().get_stats(),
        }
    }

    /// Advice for operators based on cache fill and configuration.
    pub fn recommendations(&self, config: &CacheConfig) -> Vec<String> {
        let mut recommendations = Vec::new();

        if self.cache().get_stats().total_entries < 10 {
            recommendations.push(
                "Consider running cache warming to improve initial response times".to_string(),
            );
        }
        if !config.enable_warming {
            recommendations
                .push("Cache warming is disabled - enable it for better performance".to_string());
        }
        if config.is_production() {
            recommendations.push(
                "Schedule regular cache warming in production for optimal performance".to_string(),
            );
        }
        if recommendations.is_empty() {
            recommendations.push("Cache warming is properly configured".to_string());
        }

        recommendations
    }
}

fn load_from_disk(path: &Path) -> anyhow::Result<Dataset> {
    Ok(models::load_and_validate(path)?)
}

fn record<T>(task: &str, outcome: anyhow::Result<T>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(err) => {
            error!(task, error = %err, "Cache warming task failed");
            false
        }
    }
}

// == Warming Guard ==
/// Holds the in-progress flag; clears it on drop.
struct WarmingGuard {
    service: Arc<WarmingService>,
}

impl WarmingGuard {
    fn acquire(service: &Arc<WarmingService>) -> Option<Self> {
        service
            .is_warming
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                service: Arc::clone(service),
            })
    }
}

impl Drop for WarmingGuard {
    fn drop(&mut self) {
        self.service.is_warming.store(false, Ordering::SeqCst);
    }
}

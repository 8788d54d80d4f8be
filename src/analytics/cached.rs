//! Cached analytics
//!
//! Explicit get-or-compute wrappers routing each computation through its
//! cache role.

use std::sync::Arc;

use crate::analytics::{
    Analytics, DailyRevenue, LostIncomeSummary, PropertyRevenue, PropertyRevenueSummary,
    RevenueTimeline,
};
use crate::cache::{CacheManager, CallArgs};
use crate::models::{Dataset, DateRange};

/// Analytics front that consults the cache before computing.
///
/// The dataset is not part of any key: a changed data file clears the query
/// and aggregation roles through [`CacheManager::get_data`].
#[derive(Clone)]
pub struct CachedAnalytics {
    cache: Arc<CacheManager>,
    analytics: Arc<dyn Analytics>,
}

impl CachedAnalytics {
    pub fn new(cache: Arc<CacheManager>, analytics: Arc<dyn Analytics>) -> Self {
        Self { cache, analytics }
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    // == Aggregations ==
    pub fn daily_revenue(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Arc<Vec<DailyRevenue>>> {
        self.cache
            .get_aggregation_result("daily_revenue", &range_args(range), || {
                self.analytics.daily_revenue(data, range)
            })
    }

    pub fn property_revenue(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Arc<Vec<PropertyRevenue>>> {
        self.cache
            .get_aggregation_result("property_revenue", &range_args(range), || {
                self.analytics.property_revenue(data, range)
            })
    }

    // == Queries ==
    pub fn revenue_timeline(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Arc<RevenueTimeline>> {
        self.cache
            .get_query_result("revenue_timeline", &range_args(range), || {
                let points = self.daily_revenue(data, range)?;
                Ok(RevenueTimeline {
                    range: *range,
                    total_revenue: points.iter().map(|p| p.revenue).sum(),
                    points: points.as_ref().clone(),
                })
            })
    }

    pub fn property_revenue_summary(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Arc<PropertyRevenueSummary>> {
        self.cache
            .get_query_result("property_revenue_summary", &range_args(range), || {
                let properties = self.property_revenue(data, range)?;
                Ok(PropertyRevenueSummary {
                    range: *range,
                    total_revenue: properties.iter().map(|p| p.revenue).sum(),
                    properties: properties.as_ref().clone(),
                })
            })
    }

    pub fn lost_income_summary(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Arc<LostIncomeSummary>> {
        self.cache
            .get_query_result("lost_income_summary", &range_args(range), || {
                self.analytics.lost_income(data, range)
            })
    }
}

fn range_args(range: &DateRange) -> CallArgs {
    CallArgs::new()
        .kwarg("start_date", range.start)
        .kwarg("end_date", range.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{date, sample_dataset};
    use crate::analytics::StandardAnalytics;
    use crate::cache::CacheRole;
    use crate::config::CacheConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls into the wrapped analytics.
    #[derive(Default)]
    struct CountingAnalytics {
        daily: AtomicUsize,
        lost: AtomicUsize,
    }

    impl Analytics for CountingAnalytics {
        fn daily_revenue(
            &self,
            data: &Dataset,
            range: &DateRange,
        ) -> anyhow::Result<Vec<DailyRevenue>> {
            self.daily.fetch_add(1, Ordering::SeqCst);
            StandardAnalytics.daily_revenue(data, range)
        }

        fn property_revenue(
            &self,
            data: &Dataset,
            range: &DateRange,
        ) -> anyhow::Result<Vec<PropertyRevenue>> {
            StandardAnalytics.property_revenue(data, range)
        }

        fn lost_income(
            &self,
            _data: &Dataset,
            _range: &DateRange,
        ) -> anyhow::Result<LostIncomeSummary> {
            self.lost.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("rate table unavailable")
        }
    }

    fn setup() -> (CachedAnalytics, Arc<CountingAnalytics>) {
        let cache = Arc::new(CacheManager::from_config(&CacheConfig::default()).unwrap());
        let counting = Arc::new(CountingAnalytics::default());
        (CachedAnalytics::new(cache, counting.clone()), counting)
    }

    #[test]
    fn test_timeline_fills_query_and_aggregation_roles() {
        let (analytics, counting) = setup();
        let data = sample_dataset();
        let range = DateRange::new(date("2024-01-01"), date("2024-01-31"));

        let first = analytics.revenue_timeline(&data, &range).unwrap();
        let second = analytics.revenue_timeline(&data, &range).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.total_revenue, 690.0);
        assert_eq!(counting.daily.load(Ordering::SeqCst), 1);
        assert_eq!(analytics.cache().cache(CacheRole::Query).size(), 1);
        assert_eq!(analytics.cache().cache(CacheRole::Aggregation).size(), 1);
    }

    #[test]
    fn test_distinct_ranges_are_cached_separately() {
        let (analytics, counting) = setup();
        let data = sample_dataset();

        analytics
            .revenue_timeline(&data, &DateRange::unbounded())
            .unwrap();
        analytics
            .revenue_timeline(&data, &DateRange::new(date("2024-01-01"), date("2024-01-02")))
            .unwrap();

        assert_eq!(counting.daily.load(Ordering::SeqCst), 2);
        assert_eq!(analytics.cache().cache(CacheRole::Query).size(), 2);
    }

    #[test]
    fn test_failure_propagates_and_is_not_cached() {
        let (analytics, counting) = setup();
        let data = sample_dataset();
        let range = DateRange::unbounded();

        let err = analytics.lost_income_summary(&data, &range).unwrap_err();
        assert_eq!(err.to_string(), "rate table unavailable");
        assert!(analytics.lost_income_summary(&data, &range).is_err());

        assert_eq!(counting.lost.load(Ordering::SeqCst), 2);
        assert_eq!(analytics.cache().cache(CacheRole::Query).size(), 0);
    }

    #[test]
    fn test_summary_keys_are_invalidatable_by_name() {
        let (analytics, _) = setup();
        let data = sample_dataset();

        analytics
            .property_revenue_summary(&data, &DateRange::unbounded())
            .unwrap();

        // Removes the query entry and its aggregation
        assert_eq!(analytics.cache().invalidate_pattern("property_revenue"), 2);
    }
}

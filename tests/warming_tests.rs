//! Integration Tests for the Warming Service
//!
//! Runs full warming cycles against real dataset files and checks the
//! single-flight guard under a multi-threaded runtime.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;
use str_analytics_cache::analytics::StandardAnalytics;
use str_analytics_cache::models::{load_and_validate, Dataset};
use str_analytics_cache::{CacheConfig, CacheManager, CacheRole, WarmingOutcome, WarmingService};

// == Helper Functions ==

fn create_cache() -> Arc<CacheManager> {
    Arc::new(CacheManager::from_config(&CacheConfig::default()).unwrap())
}

async fn wait_until_warming(service: &WarmingService) {
    for _ in 0..200 {
        if service.is_warming() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("warming never started");
}

// == Full Cycle ==

#[tokio::test]
async fn test_full_cycle_with_default_loader() {
    let file = common::dataset_file();
    let service = Arc::new(WarmingService::new(create_cache(), Arc::new(StandardAnalytics)));

    let outcome = service.warm_all_caches(file.path()).await;

    let report = match outcome {
        WarmingOutcome::Completed(report) => report,
        other => panic!("expected completed, got {:?}", other),
    };
    assert!(report.data_cache);
    assert_eq!(report.query_caches.len(), 4);
    assert!(report.query_caches.values().all(|ok| *ok));
    assert_eq!(report.date_ranges.len(), 5);
    assert!(report.date_ranges.values().all(|ok| *ok));
    assert_eq!(report.cache_stats.data.size, 1);
    assert!(report.cache_stats.query.size > 0);
    assert!(report.cache_stats.aggregation.size > 0);

    let status = service.get_warming_status();
    assert!(!status.is_warming);
    assert!(status.last_warming_time.is_some());
    assert_eq!(status.last_results, Some(report));
}

#[tokio::test]
async fn test_second_cycle_reuses_cached_dataset() {
    let file = common::dataset_file();
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let service = Arc::new(
        WarmingService::new(create_cache(), Arc::new(StandardAnalytics)).with_loader(
            move |path| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(load_and_validate(path)?)
            },
        ),
    );

    assert!(service.warm_all_caches(file.path()).await.is_completed());
    assert!(service.warm_all_caches(file.path()).await.is_completed());

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_data_load_aborts_cycle() {
    let file = common::dataset_file();
    let service = Arc::new(
        WarmingService::new(create_cache(), Arc::new(StandardAnalytics))
            .with_loader(|_| anyhow::bail!("disk unavailable")),
    );

    let outcome = service.warm_all_caches(file.path()).await;

    match outcome {
        WarmingOutcome::Failed { message, .. } => {
            assert!(message.contains("disk unavailable"), "message: {}", message)
        }
        other => panic!("expected failed, got {:?}", other),
    }

    let cache = service.cache();
    assert_eq!(cache.cache(CacheRole::Query).size(), 0);
    assert_eq!(cache.cache(CacheRole::Aggregation).size(), 0);

    let status = service.get_warming_status();
    assert!(!status.is_warming);
    assert!(status.last_warming_time.is_none());
    assert!(status.last_results.is_none());
}

#[tokio::test]
async fn test_panicking_cycle_reports_internal_failure() {
    let service = Arc::new(
        WarmingService::new(create_cache(), Arc::new(StandardAnalytics))
            .with_loader(|_| panic!("loader bug")),
    );

    let outcome = service.warm_all_caches("/nonexistent/str_data.json").await;

    match outcome {
        WarmingOutcome::Failed { message, .. } => {
            assert!(message.starts_with("Internal error"), "message: {}", message)
        }
        other => panic!("expected failed, got {:?}", other),
    }
    // The guard unwound with the blocking task
    assert!(!service.is_warming());
}

#[tokio::test]
async fn test_invalid_dataset_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"{\"properties\": []}").unwrap();
    let service = Arc::new(WarmingService::new(create_cache(), Arc::new(StandardAnalytics)));

    let outcome = service.warm_all_caches(file.path()).await;

    assert!(matches!(outcome, WarmingOutcome::Failed { .. }));
    assert_eq!(service.cache().get_stats().total_entries, 0);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_cycle_reports_already_warming() {
    let file = common::dataset_file();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let service = Arc::new(
        WarmingService::new(create_cache(), Arc::new(StandardAnalytics)).with_loader(
            move |path| {
                // Block the first cycle until the test releases it
                let _ = release_rx.lock().recv();
                Ok(load_and_validate(path)?)
            },
        ),
    );

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        let path = file.path().to_path_buf();
        async move { service.warm_all_caches(path).await }
    });

    wait_until_warming(&service).await;

    let second = service.warm_all_caches(file.path()).await;
    assert!(matches!(second, WarmingOutcome::AlreadyWarming { .. }));
    assert!(service.get_warming_status().is_warming);

    release_tx.send(()).unwrap();
    drop(release_tx);

    let first = first.await.unwrap();
    assert!(first.is_completed());
    assert!(!service.is_warming());
}

#[tokio::test]
async fn test_outcome_serializes_with_status_tag() {
    let service = Arc::new(
        WarmingService::new(create_cache(), Arc::new(StandardAnalytics))
            .with_loader(|_| Ok(Dataset::default())),
    );

    let outcome = service.warm_all_caches("/nonexistent/str_data.json").await;
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "completed");
    assert_eq!(json["data_cache"], true);
    assert!(json["query_caches"].get("full_dataset").is_some());
}

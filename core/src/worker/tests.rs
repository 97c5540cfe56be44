//! Integration tests for the Worker module

use super::*;
use crate::aggregator::StatsAggregator;
use crate::config::{ConfigUpdate, KnobConfig};
use crate::issuer::RequestIssuer;
use crate::mock::MockFetcher;
use crate::run_flag::RunFlag;

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helper functions
// ============================================================================

struct Harness {
    fetcher: Arc<MockFetcher>,
    stats: Arc<StatsAggregator>,
    config: Arc<RwLock<KnobConfig>>,
    run_flag: Arc<RunFlag>,
}

impl Harness {
    fn new(fetcher: MockFetcher, delay_millis: u64) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            stats: Arc::new(StatsAggregator::new()),
            config: Arc::new(RwLock::new(KnobConfig::new(delay_millis, 1, "/ok.json"))),
            run_flag: Arc::new(RunFlag::new()),
        }
    }

    fn worker(&self, id: usize, generation: u64) -> Worker {
        WorkerBuilder::new(id, generation)
            .target_uri("/ok.json")
            .issuer(RequestIssuer::new(self.fetcher.clone()))
            .stats(Arc::clone(&self.stats))
            .config(Arc::clone(&self.config))
            .run_flag(Arc::clone(&self.run_flag))
            .build()
            .expect("Failed to build worker")
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_worker_runs_until_stopped() {
    let harness = Harness::new(MockFetcher::new(), 100);
    let generation = harness.run_flag.begin().unwrap();
    let worker = harness.worker(0, generation);
    assert_eq!(worker.id(), 0);
    assert_eq!(worker.generation(), generation);

    let handle = tokio::spawn(worker.run());

    tokio::time::sleep(Duration::from_millis(350)).await;
    harness.run_flag.end();

    let tally = handle.await.expect("Worker task panicked");
    assert_eq!(tally.completed, 3);
    assert_eq!(tally.errors, 0);
    assert_eq!(harness.stats.snapshot().call_count, 3);
    assert_eq!(harness.fetcher.started(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_worker_keeps_going_through_failures() {
    let harness = Harness::new(MockFetcher::new().failing(), 100);
    let generation = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, generation).run());

    tokio::time::sleep(Duration::from_millis(550)).await;
    harness.run_flag.end();

    let tally = handle.await.expect("Worker task panicked");
    let snap = harness.stats.snapshot();
    assert_eq!(tally.errors, 5);
    assert_eq!(snap.call_count, 5);
    assert_eq!(snap.error_count, snap.call_count);
    assert_eq!(snap.response_count, snap.call_count);
}

#[tokio::test(start_paused = true)]
async fn test_worker_mixed_outcomes() {
    let harness = Harness::new(MockFetcher::new().with_fail_every(2), 100);
    let generation = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, generation).run());

    tokio::time::sleep(Duration::from_millis(450)).await;
    harness.run_flag.end();

    let tally = handle.await.expect("Worker task panicked");
    assert_eq!(tally.total_requests(), 4);
    assert_eq!(tally.errors, 2);
    assert!((tally.error_rate() - 0.5).abs() < 0.001);
    assert_eq!(harness.stats.snapshot().error_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_worker_picks_up_delay_change_on_next_wait() {
    let harness = Harness::new(MockFetcher::new(), 1_000);
    let generation = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, generation).run());

    // first request at 1000ms; the worker is then sleeping until 2000ms
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    harness
        .config
        .write()
        .apply(ConfigUpdate::DelayMillis(100))
        .unwrap();

    // requests at 2000, 2100 and 2200ms
    tokio::time::sleep(Duration::from_millis(750)).await;
    harness.run_flag.end();

    handle.await.expect("Worker task panicked");
    assert_eq!(harness.stats.snapshot().call_count, 4);
}

#[tokio::test(start_paused = true)]
async fn test_worker_never_overlaps_requests() {
    let harness = Harness::new(
        MockFetcher::new().with_delay(Duration::from_millis(250)),
        100,
    );
    let generation = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, generation).run());

    // cycles: wait 100 + request 250; completions at 350 and 700
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(harness.fetcher.max_in_flight(), 1);
    assert_eq!(harness.fetcher.started(), 3);
    assert_eq!(harness.stats.snapshot().call_count, 2);

    harness.run_flag.end();
    handle.await.expect("Worker task panicked");

    // the request in flight at stop still completes and is recorded
    assert_eq!(harness.stats.snapshot().call_count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_cancel_in_flight_request() {
    let harness = Harness::new(
        MockFetcher::new().with_delay(Duration::from_millis(200)),
        100,
    );
    let generation = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, generation).run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.fetcher.started(), 1);
    assert_eq!(harness.stats.snapshot().call_count, 0);
    harness.run_flag.end();

    let tally = handle.await.expect("Worker task panicked");
    assert_eq!(tally.completed, 1);
    assert_eq!(harness.stats.snapshot().call_count, 1);
    assert_eq!(harness.fetcher.started(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_worker_of_previous_run_exits_after_restart() {
    let harness = Harness::new(MockFetcher::new(), 100);
    let first = harness.run_flag.begin().unwrap();
    let handle = tokio::spawn(harness.worker(0, first).run());

    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.run_flag.end();
    let second = harness.run_flag.begin().unwrap();
    assert_ne!(first, second);

    let tally = handle.await.expect("Worker task panicked");
    assert_eq!(tally.total_requests(), 0);
    assert_eq!(harness.fetcher.started(), 0);
}

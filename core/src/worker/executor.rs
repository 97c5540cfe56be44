//! Worker execution loop

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::aggregator::StatsAggregator;
use crate::config::KnobConfig;
use crate::issuer::RequestIssuer;
use crate::record::RequestRecord;
use crate::run_flag::RunFlag;

use super::stats::WorkerStats;

/// Worker paces itself in a loop: wait -> check run flag -> issue -> record
///
/// Workers are tokio tasks spawned by the Engine. They share the issuer,
/// stats and configuration via Arc. Stop is observed only after the pacing
/// wait, so an in-flight request always completes and is recorded.
pub struct Worker {
    /// Worker identifier within its run
    id: usize,

    /// Run generation this worker belongs to
    generation: u64,

    /// Endpoint, frozen for the whole run
    target_uri: String,

    /// Request issuer (shared across workers)
    issuer: RequestIssuer,

    /// Shared stats
    stats: Arc<StatsAggregator>,

    /// Live configuration, read for the delay every iteration
    config: Arc<RwLock<KnobConfig>>,

    /// Shared run flag
    run_flag: Arc<RunFlag>,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        generation: u64,
        target_uri: String,
        issuer: RequestIssuer,
        stats: Arc<StatsAggregator>,
        config: Arc<RwLock<KnobConfig>>,
        run_flag: Arc<RunFlag>,
    ) -> Self {
        Self {
            id,
            generation,
            target_uri,
            issuer,
            stats,
            config,
            run_flag,
        }
    }

    /// Run the worker loop until its run is no longer live
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(
            worker_id = self.id,
            generation = self.generation,
            "Worker started"
        );

        loop {
            let delay = self.config.read().delay();
            tokio::time::sleep(delay).await;

            if !self.run_flag.is_live(self.generation) {
                break;
            }

            let start = Instant::now();
            let outcome = self.issuer.issue(&self.target_uri).await;
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            if outcome.is_failure() {
                stats.record_error();
                tracing::warn!(
                    worker_id = self.id,
                    payload = %outcome.payload(),
                    "Request failed"
                );
            } else {
                stats.record_success();
            }

            self.stats
                .record(RequestRecord::new(self.id, outcome, latency_ms));
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            generation = self.generation,
            completed = stats.completed,
            errors = stats.errors,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        stats
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the run generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("target_uri", &self.target_uri)
            .field("issuer", &self.issuer)
            .finish()
    }
}

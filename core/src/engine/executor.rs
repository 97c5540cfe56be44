//! Engine lifecycle: start, stop, reset and configuration

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::aggregator::{StatsAggregator, StatsSnapshot};
use crate::config::{ConfigError, ConfigUpdate, KnobConfig};
use crate::error::Result;
use crate::issuer::RequestIssuer;
use crate::record::RequestRecord;
use crate::run_flag::RunFlag;
use crate::worker::{Worker, WorkerBuilder, WorkerStats};

use super::report::{EngineSnapshot, Report};

/// Responses included in a [`Report`] built by [`Engine::report`]
pub const REPORT_RECENT_RESPONSES: usize = 10;

/// Worker loops that have not exited, keyed by run generation
type LoopCounts = Arc<Mutex<BTreeMap<u64, usize>>>;

/// Engine owns the run flag, configuration and stats
///
/// Cheap to clone; every clone drives the same workers. All lifecycle
/// operations return immediately, workers run on the tokio runtime the
/// engine was built on.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    /// Live configuration, shared with workers
    config: Arc<RwLock<KnobConfig>>,

    /// Configuration restored by `reset`
    defaults: KnobConfig,

    /// Shared stats
    stats: Arc<StatsAggregator>,

    /// Running bit and run generation
    run_flag: Arc<RunFlag>,

    /// Issuer handed to every worker
    issuer: RequestIssuer,

    /// Runtime workers are spawned on
    runtime: Handle,

    /// Serializes lifecycle operations and keeps worker handles for `drain`
    lifecycle: Mutex<Vec<JoinHandle<WorkerStats>>>,

    /// Worker loops that have not exited, per generation
    loops: LoopCounts,
}

/// Removes a worker from its generation's loop count when its task ends
struct LoopGuard {
    loops: LoopCounts,
    generation: u64,
}

impl LoopGuard {
    fn enter(loops: &LoopCounts, generation: u64) -> Self {
        *loops.lock().entry(generation).or_insert(0) += 1;
        Self {
            loops: Arc::clone(loops),
            generation,
        }
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        let mut loops = self.loops.lock();
        if let Some(count) = loops.get_mut(&self.generation) {
            *count -= 1;
            if *count == 0 {
                loops.remove(&self.generation);
            }
        }
    }
}

impl Engine {
    /// Create a new engine from configurations already validated by
    /// `EngineBuilder::build`
    pub(crate) fn new(
        config: KnobConfig,
        defaults: KnobConfig,
        issuer: RequestIssuer,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config: Arc::new(RwLock::new(config)),
                defaults,
                stats: Arc::new(StatsAggregator::new()),
                run_flag: Arc::new(RunFlag::new()),
                issuer,
                runtime,
                lifecycle: Mutex::new(Vec::new()),
                loops: Arc::new(Mutex::new(BTreeMap::new())),
            }),
        }
    }

    /// Start a run with `worker_count` workers
    ///
    /// No-op when a run is already active. Stats are kept from earlier runs.
    pub fn start(&self) {
        let inner = &self.inner;
        let mut handles = inner.lifecycle.lock();

        let Some(generation) = inner.run_flag.begin() else {
            tracing::debug!("Start ignored: already running");
            return;
        };

        handles.retain(|handle| !handle.is_finished());

        let config = inner.config.read().clone();
        tracing::info!(
            generation,
            worker_count = config.worker_count,
            delay_millis = config.delay_millis,
            target_uri = %config.target_uri,
            "Starting run"
        );

        for worker_id in 0..config.worker_count {
            let worker = match self.build_worker(worker_id, generation, &config.target_uri) {
                Ok(worker) => worker,
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "Failed to build worker");
                    continue;
                }
            };

            let guard = LoopGuard::enter(&inner.loops, generation);
            handles.push(inner.runtime.spawn(async move {
                let _guard = guard;
                worker.run().await
            }));
        }
    }

    /// Stop issuing new requests
    ///
    /// In-flight requests and pending waits are not cancelled; every worker
    /// exits the next time it wakes.
    pub fn stop(&self) {
        let _lifecycle = self.inner.lifecycle.lock();
        if self.inner.run_flag.end() {
            tracing::info!(
                exiting_workers = self.worker_loops(),
                "Stopping run; in-flight requests will still complete"
            );
        } else {
            tracing::debug!("Stop ignored: not running");
        }
    }

    /// Stop and restore default configuration and empty stats
    ///
    /// When called on a running engine, a worker with a request already in
    /// flight records that one outcome into the fresh stats before exiting.
    pub fn reset(&self) {
        let _lifecycle = self.inner.lifecycle.lock();
        let was_running = self.inner.run_flag.end();
        *self.inner.config.write() = self.inner.defaults.clone();
        self.inner.stats.reset();

        if was_running {
            tracing::warn!("Reset while running; stale in-flight requests may still be recorded");
        }
        tracing::info!("Engine reset to defaults");
    }

    /// Validate and apply a single configuration update
    ///
    /// `worker_count` and `target_uri` are rejected while running.
    pub fn set_config(&self, update: ConfigUpdate) -> std::result::Result<(), ConfigError> {
        let _lifecycle = self.inner.lifecycle.lock();
        let field = update.field();
        if field.locked_while_running() && self.inner.run_flag.is_running() {
            return Err(ConfigError::LockedWhileRunning(field));
        }

        self.inner.config.write().apply(update)?;
        tracing::debug!(%field, "Configuration updated");
        Ok(())
    }

    /// Wait for every spawned worker to exit and collect their tallies
    ///
    /// Meant to be called after `stop`; while running it waits until the run
    /// is stopped by another handle.
    pub async fn drain(&self) -> Vec<WorkerStats> {
        let handles = std::mem::take(&mut *self.inner.lifecycle.lock());
        let mut tallies = Vec::with_capacity(handles.len());

        for (idx, result) in futures::future::join_all(handles).await.into_iter().enumerate() {
            match result {
                Ok(tally) => tallies.push(tally),
                Err(e) => tracing::error!(task = idx, error = %e, "Worker task panicked"),
            }
        }

        tracing::debug!(workers = tallies.len(), "Workers drained");
        tallies
    }

    /// Presentation view of configuration, run state and counters
    pub fn snapshot(&self) -> EngineSnapshot {
        let config = self.config();
        let stats = self.stats();
        let (active_workers, worker_loops) = self.loop_counts();
        EngineSnapshot {
            delay_millis: config.delay_millis,
            worker_count: config.worker_count,
            target_uri: config.target_uri,
            running: self.is_running(),
            call_count: stats.call_count,
            error_count: stats.error_count,
            response_count: stats.response_count,
            active_workers,
            exiting_workers: worker_loops - active_workers,
        }
    }

    /// Emit the full state to the diagnostic log and return a report
    /// holding the last [`REPORT_RECENT_RESPONSES`] responses
    pub fn report(&self) -> Report {
        let mut report = self.full_report();

        match serde_json::to_string(&report) {
            Ok(json) => tracing::info!(target: "loadknob::report", report = %json, "State report"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize report"),
        }

        let older = report.responses.len().saturating_sub(REPORT_RECENT_RESPONSES);
        report.responses.drain(..older);
        report
    }

    /// Report holding the whole responses log
    pub fn full_report(&self) -> Report {
        let snapshot = self.snapshot();
        let stats = StatsSnapshot {
            call_count: snapshot.call_count,
            error_count: snapshot.error_count,
            response_count: snapshot.response_count,
        };
        Report {
            generated_at: chrono::Utc::now(),
            success_rate: stats.success_rate(),
            error_rate: stats.error_rate(),
            latency: self.inner.stats.latency_summary(),
            responses: self.inner.stats.responses(),
            snapshot,
        }
    }

    /// Current configuration
    pub fn config(&self) -> KnobConfig {
        self.inner.config.read().clone()
    }

    /// Whether a run is active
    pub fn is_running(&self) -> bool {
        self.inner.run_flag.is_running()
    }

    /// Current counters
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Copy of the responses log
    pub fn responses(&self) -> Vec<RequestRecord> {
        self.inner.stats.responses()
    }

    /// Workers of the live run; never more than `worker_count`
    pub fn active_workers(&self) -> usize {
        self.loop_counts().0
    }

    /// Worker loops of any run that have not exited yet
    ///
    /// Includes workers of a stopped run still sleeping out their last wait.
    pub fn worker_loops(&self) -> usize {
        self.loop_counts().1
    }

    /// Number of runs started so far
    pub fn runs_started(&self) -> u64 {
        self.inner.run_flag.generation()
    }

    /// Live-run workers and all worker loops, read under one lock
    fn loop_counts(&self) -> (usize, usize) {
        let loops = self.inner.loops.lock();
        let live = self
            .inner
            .run_flag
            .live_generation()
            .and_then(|generation| loops.get(&generation).copied())
            .unwrap_or(0);
        (live, loops.values().sum())
    }

    fn build_worker(&self, worker_id: usize, generation: u64, target_uri: &str) -> Result<Worker> {
        WorkerBuilder::new(worker_id, generation)
            .target_uri(target_uri)
            .issuer(self.inner.issuer.clone())
            .stats(Arc::clone(&self.inner.stats))
            .config(Arc::clone(&self.inner.config))
            .run_flag(Arc::clone(&self.inner.run_flag))
            .build()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &*self.inner.config.read())
            .field("running", &self.is_running())
            .field("issuer", &self.inner.issuer)
            .finish()
    }
}

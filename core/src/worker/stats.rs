//! Per-worker tallies

use tokio::time::Instant;

/// Statistics tracked privately by each worker
///
/// Returned when the worker exits; the shared view lives in
/// [`StatsAggregator`](crate::aggregator::StatsAggregator).
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Number of successful requests
    pub completed: usize,

    /// Number of failed requests
    pub errors: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Get total number of requests (completed + errors)
    pub fn total_requests(&self) -> usize {
        self.completed + self.errors
    }

    /// Get error rate (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.total_requests() == 0 {
            0.0
        } else {
            self.errors as f64 / self.total_requests() as f64
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Record a successful request
    pub fn record_success(&mut self) {
        self.completed += 1;
    }

    /// Record a failed request
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Merge stats from another worker
    pub fn merge(&mut self, other: &WorkerStats) {
        self.completed += other.completed;
        self.errors += other.errors;
    }
}

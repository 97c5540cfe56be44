//! Shared stats aggregation across all workers

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::latency::LatencySummary;
use crate::record::RequestRecord;

/// Counter view of the shared stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Completed round-trips, success or failure
    pub call_count: usize,

    /// Completed round-trips that failed
    pub error_count: usize,

    /// Entries in the responses log
    pub response_count: usize,
}

impl StatsSnapshot {
    /// Get the success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.call_count > 0 {
            (self.call_count - self.error_count) as f64 / self.call_count as f64
        } else {
            0.0
        }
    }

    /// Get the error rate (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.call_count > 0 {
            self.error_count as f64 / self.call_count as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    call_count: usize,
    error_count: usize,
    responses: Vec<RequestRecord>,
}

/// Stats shared by every worker of an engine
///
/// All three fields change together under one lock, so a reader never sees
/// an error counted without its response appended.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Stats>,
}

impl StatsAggregator {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request
    pub fn record(&self, record: RequestRecord) {
        let failed = record.outcome.is_failure();
        let mut stats = self.inner.lock();
        stats.call_count += 1;
        if failed {
            stats.error_count += 1;
        }
        stats.responses.push(record);
    }

    /// Current counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self.inner.lock();
        StatsSnapshot {
            call_count: stats.call_count,
            error_count: stats.error_count,
            response_count: stats.responses.len(),
        }
    }

    /// Copy of the full responses log, in arrival order
    pub fn responses(&self) -> Vec<RequestRecord> {
        self.inner.lock().responses.clone()
    }

    /// The last `n` responses, oldest first
    pub fn recent(&self, n: usize) -> Vec<RequestRecord> {
        let stats = self.inner.lock();
        let start = stats.responses.len().saturating_sub(n);
        stats.responses[start..].to_vec()
    }

    /// Latency summary over every recorded response
    pub fn latency_summary(&self) -> LatencySummary {
        let latencies: Vec<f64> = {
            let stats = self.inner.lock();
            stats.responses.iter().map(|r| r.latency_ms).collect()
        };
        LatencySummary::from_values(&latencies)
    }

    /// Drop every counter and response
    pub fn reset(&self) {
        *self.inner.lock() = Stats::default();
    }
}

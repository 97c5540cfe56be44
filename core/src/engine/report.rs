//! Snapshots and reports handed to the presentation layer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::latency::LatencySummary;
use crate::record::RequestRecord;

/// Everything the presentation layer reads from the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Pacing interval per worker
    pub delay_millis: u64,
    /// Configured number of workers
    pub worker_count: usize,
    /// Endpoint being requested
    pub target_uri: String,
    /// Whether a run is active
    pub running: bool,
    /// Completed round-trips
    pub call_count: usize,
    /// Failed round-trips
    pub error_count: usize,
    /// Entries in the responses log
    pub response_count: usize,
    /// Workers of the live run
    pub active_workers: usize,
    /// Workers of a stopped run that have not woken to exit yet
    pub exiting_workers: usize,
}

/// Full state dump emitted by the `report` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// When the report was built
    pub generated_at: DateTime<Utc>,
    /// Engine state at that moment
    pub snapshot: EngineSnapshot,
    /// Share of successful round-trips (0.0 - 1.0)
    pub success_rate: f64,
    /// Share of failed round-trips (0.0 - 1.0)
    pub error_rate: f64,
    /// Latency over every recorded response
    pub latency: LatencySummary,
    /// Responses, oldest first: the recent tail or the whole log
    pub responses: Vec<RequestRecord>,
}

impl fmt::Display for EngineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | delay {}ms | workers {} ({} active, {} exiting) | calls {} | errors {} | responses {} | {}",
            if self.running { "running" } else { "stopped" },
            self.delay_millis,
            self.worker_count,
            self.active_workers,
            self.exiting_workers,
            self.call_count,
            self.error_count,
            self.response_count,
            self.target_uri,
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "Report @ {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "  Target:      {}", s.target_uri)?;
        writeln!(
            f,
            "  State:       {} ({} of {} workers active, {} exiting)",
            if s.running { "running" } else { "stopped" },
            s.active_workers,
            s.worker_count,
            s.exiting_workers
        )?;
        writeln!(f, "  Delay:       {}ms", s.delay_millis)?;
        writeln!(
            f,
            "  Calls:       {} ({} errors, {:.1}% success)",
            s.call_count,
            s.error_count,
            self.success_rate * 100.0
        )?;
        writeln!(
            f,
            "  Latency ms:  min {:.1} | p50 {:.1} | p95 {:.1} | p99 {:.1} | max {:.1}",
            self.latency.min, self.latency.p50, self.latency.p95, self.latency.p99, self.latency.max
        )?;
        if !self.responses.is_empty() {
            writeln!(f, "  Responses:")?;
            for record in &self.responses {
                writeln!(
                    f,
                    "    [{}] worker {} {:>8.1}ms {}",
                    record.completed_at.format("%H:%M:%S%.3f"),
                    record.worker_id,
                    record.latency_ms,
                    record.outcome.payload()
                )?;
            }
        }
        Ok(())
    }
}

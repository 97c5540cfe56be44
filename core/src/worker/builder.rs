//! Builder pattern for Worker construction

use std::sync::Arc;

use parking_lot::RwLock;

use crate::aggregator::StatsAggregator;
use crate::config::KnobConfig;
use crate::error::{Error, Result};
use crate::issuer::RequestIssuer;
use crate::run_flag::RunFlag;

use super::executor::Worker;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0, generation)
///     .target_uri("/ok.json")
///     .issuer(issuer)
///     .stats(stats)
///     .config(config)
///     .run_flag(run_flag)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    generation: u64,
    target_uri: Option<String>,
    issuer: Option<RequestIssuer>,
    stats: Option<Arc<StatsAggregator>>,
    config: Option<Arc<RwLock<KnobConfig>>>,
    run_flag: Option<Arc<RunFlag>>,
}

impl WorkerBuilder {
    /// Create a new builder for worker `id` of run `generation`
    pub fn new(id: usize, generation: u64) -> Self {
        Self {
            id,
            generation,
            target_uri: None,
            issuer: None,
            stats: None,
            config: None,
            run_flag: None,
        }
    }

    /// Set the endpoint
    pub fn target_uri(mut self, uri: impl Into<String>) -> Self {
        self.target_uri = Some(uri.into());
        self
    }

    /// Set the request issuer
    pub fn issuer(mut self, issuer: RequestIssuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Set the shared stats
    pub fn stats(mut self, stats: Arc<StatsAggregator>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Set the live configuration
    pub fn config(mut self, config: Arc<RwLock<KnobConfig>>) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the shared run flag
    pub fn run_flag(mut self, run_flag: Arc<RunFlag>) -> Self {
        self.run_flag = Some(run_flag);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> Result<Worker> {
        let target_uri = self.target_uri.ok_or(Error::missing("target_uri"))?;
        let issuer = self.issuer.ok_or(Error::missing("issuer"))?;
        let stats = self.stats.ok_or(Error::missing("stats"))?;
        let config = self.config.ok_or(Error::missing("config"))?;
        let run_flag = self.run_flag.ok_or(Error::missing("run_flag"))?;

        Ok(Worker::new(
            self.id,
            self.generation,
            target_uri,
            issuer,
            stats,
            config,
            run_flag,
        ))
    }
}

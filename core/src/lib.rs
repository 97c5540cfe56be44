//! loadknob-core: the request-generation engine
//!
//! A pool of paced worker loops issues GET requests against one target and
//! feeds their outcomes into shared stats, governed by a start/stop/reset
//! lifecycle:
//!
//! - Engine (start, stop, reset, set_config, snapshot, report)
//! - Worker loops polling a shared run flag once per cycle
//! - Request issuer with cache busting around the [`FetchJson`] capability
//! - Stats aggregation updated in one indivisible step per response
//! - Configuration with validated per-field updates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod issuer;
pub mod latency;
pub mod record;
pub mod run_flag;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod mock;

pub use aggregator::{StatsAggregator, StatsSnapshot};
pub use config::{ConfigError, ConfigField, ConfigUpdate, KnobConfig};
pub use engine::{Engine, EngineBuilder, EngineSnapshot, Report};
pub use error::*;
pub use issuer::{cache_busted, RequestIssuer};
pub use latency::LatencySummary;
pub use record::{Outcome, RequestRecord};
pub use run_flag::RunFlag;
pub use traits::{FetchError, FetchJson};
pub use worker::{Worker, WorkerBuilder, WorkerStats};

//! Engine: run lifecycle and worker pool
//!
//! The Engine is what the presentation layer talks to:
//! - `start` spawns `worker_count` paced workers
//! - `stop` flips the run flag; workers notice on their next wake
//! - `reset` stops and restores default configuration and empty stats
//! - `set_config` validates and applies one field at a time
//! - `snapshot` / `report` expose the live state
//!
//! # Example
//!
//! ```ignore
//! use loadknob_core::{ConfigUpdate, EngineBuilder};
//!
//! let engine = EngineBuilder::new().fetcher(fetcher).build()?;
//!
//! engine.start();
//! engine.set_config(ConfigUpdate::DelayMillis(200))?;
//! // ...
//! engine.stop();
//! engine.drain().await;
//! println!("{}", engine.report());
//! ```

mod builder;
mod executor;
mod report;

pub use builder::EngineBuilder;
pub use executor::{Engine, REPORT_RECENT_RESPONSES};
pub use report::{EngineSnapshot, Report};

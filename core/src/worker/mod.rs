//! Worker module: one paced request loop
//!
//! A Worker is the producer unit of the engine, running the loop
//! **wait -> check -> issue -> record -> repeat**:
//!
//! 1. Sleeps for the configured delay, read fresh every iteration so a delay
//!    change reaches every worker on its next wait
//! 2. Checks the shared run flag; exits for good if its run is over
//! 3. Issues exactly one request through the RequestIssuer and awaits it
//! 4. Records the outcome in the shared StatsAggregator
//!
//! A worker never has more than one request outstanding. Concurrency comes
//! from running `worker_count` of them side by side.
//!
//! # Example
//!
//! ```ignore
//! use loadknob_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0, generation)
//!     .target_uri("/ok.json")
//!     .issuer(issuer)
//!     .stats(stats)
//!     .config(config)
//!     .run_flag(run_flag)
//!     .build()?;
//!
//! let tally = worker.run().await;
//! println!("Completed: {}", tally.completed);
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;

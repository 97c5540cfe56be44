//! Run flag shared between the engine and its workers

use std::sync::atomic::{AtomicU64, Ordering};

/// The `running` bit plus a run generation, packed in one atomic
///
/// Bit 0 is `running`, the remaining bits count how many runs have been
/// started. Workers remember the generation they were spawned in and only
/// keep going while that generation is the live one, so workers of a stopped
/// run never continue into the next run.
#[derive(Debug, Default)]
pub struct RunFlag {
    state: AtomicU64,
}

const RUNNING: u64 = 1;

impl RunFlag {
    /// Create a stopped flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip to running and open a new generation
    ///
    /// Returns `None` when a run is already active.
    pub fn begin(&self) -> Option<u64> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & RUNNING != 0 {
                return None;
            }
            let generation = (current >> 1) + 1;
            let next = (generation << 1) | RUNNING;
            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(generation),
                Err(actual) => current = actual,
            }
        }
    }

    /// Clear the running bit; returns whether a run was active
    pub fn end(&self) -> bool {
        self.state.fetch_and(!RUNNING, Ordering::AcqRel) & RUNNING != 0
    }

    /// Whether any run is active
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) & RUNNING != 0
    }

    /// Whether `generation` is the active run
    pub fn is_live(&self, generation: u64) -> bool {
        self.state.load(Ordering::Acquire) == (generation << 1) | RUNNING
    }

    /// Generation of the active run, if any
    pub fn live_generation(&self) -> Option<u64> {
        let state = self.state.load(Ordering::Acquire);
        (state & RUNNING != 0).then_some(state >> 1)
    }

    /// Most recently opened generation (0 before the first run)
    pub fn generation(&self) -> u64 {
        self.state.load(Ordering::Acquire) >> 1
    }
}

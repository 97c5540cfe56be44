//! Request outcomes and the records kept in the responses log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tagged result of one completed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum Outcome {
    /// The endpoint answered with a JSON body
    Success(Value),
    /// Any failure reported by the fetch capability
    Failure(Value),
}

impl Outcome {
    /// Whether this outcome counts as an error
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// The recorded payload, success body or failure description
    pub fn payload(&self) -> &Value {
        match self {
            Outcome::Success(v) | Outcome::Failure(v) => v,
        }
    }
}

/// One entry of the responses log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Worker that issued the request
    pub worker_id: usize,

    /// Result of the request
    pub outcome: Outcome,

    /// Round-trip latency in milliseconds
    pub latency_ms: f64,

    /// When the response (or failure) arrived
    pub completed_at: DateTime<Utc>,
}

impl RequestRecord {
    /// Build a record stamped with the current time
    pub fn new(worker_id: usize, outcome: Outcome, latency_ms: f64) -> Self {
        Self {
            worker_id,
            outcome,
            latency_ms,
            completed_at: Utc::now(),
        }
    }
}

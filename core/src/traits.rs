//! The fetch capability workers drive
//!
//! Defined in core so the engine never depends on a concrete transport.
//! The reqwest implementation lives in `loadknob-fetch`.

use async_trait::async_trait;
use serde_json::{json, Value};

/// Performs one GET against `uri` and decodes the JSON body
///
/// Implementations must not retry and must not apply their own caching.
/// The URI handed in already carries the cache-busting parameter.
#[async_trait]
pub trait FetchJson: Send + Sync {
    /// Fetcher identifier (e.g. "http")
    fn name(&self) -> &str;

    /// Fetch `uri` and return the decoded JSON body
    async fn fetch_json(&self, uri: &str) -> Result<Value, FetchError>;
}

/// Why a fetch did not yield a JSON body
///
/// The engine does not branch on the variant: every error becomes a failure
/// payload that is counted and logged.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Body, parsed as JSON when possible, otherwise the raw text
        body: Value,
    },

    /// Success status but the body is not JSON
    #[error("invalid JSON body: {0}")]
    Decode(String),
}

impl FetchError {
    /// JSON payload recorded in the responses log for this failure
    pub fn to_payload(&self) -> Value {
        match self {
            FetchError::Status { status, body } => json!({
                "error": self.to_string(),
                "status": status,
                "body": body,
            }),
            FetchError::Transport(_) | FetchError::Decode(_) => json!({
                "error": self.to_string(),
            }),
        }
    }
}

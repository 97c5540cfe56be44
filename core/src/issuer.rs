//! Request issuer: cache busting plus outcome tagging around [`FetchJson`]

use std::sync::Arc;

use chrono::Utc;

use crate::record::Outcome;
use crate::traits::FetchJson;

/// Query parameter carrying the cache-busting timestamp
pub const CACHE_BUST_PARAM: &str = "_";

/// Wraps the fetch capability for workers
///
/// Never fails: transport and decode errors come back as
/// [`Outcome::Failure`].
#[derive(Clone)]
pub struct RequestIssuer {
    fetcher: Arc<dyn FetchJson>,
}

impl RequestIssuer {
    /// Create an issuer over the given fetcher
    pub fn new(fetcher: Arc<dyn FetchJson>) -> Self {
        Self { fetcher }
    }

    /// Issue one GET against `uri` and wait for its outcome
    pub async fn issue(&self, uri: &str) -> Outcome {
        let busted = cache_busted(uri, Utc::now().timestamp_millis());
        match self.fetcher.fetch_json(&busted).await {
            Ok(body) => Outcome::Success(body),
            Err(e) => {
                tracing::debug!(uri = %busted, error = %e, "Request failed");
                Outcome::Failure(e.to_payload())
            }
        }
    }

    /// Name of the wrapped fetcher
    pub fn fetcher_name(&self) -> &str {
        self.fetcher.name()
    }
}

impl std::fmt::Debug for RequestIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestIssuer")
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

/// Append `_=<stamp>` to `uri`, keeping any fragment at the end
pub fn cache_busted(uri: &str, stamp: i64) -> String {
    let (base, fragment) = match uri.find('#') {
        Some(idx) => uri.split_at(idx),
        None => (uri, ""),
    };
    let sep = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{base}{sep}{CACHE_BUST_PARAM}={stamp}{fragment}")
}

//! Mock fetcher shared by the worker and engine tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::traits::{FetchError, FetchJson};

pub(crate) struct MockFetcher {
    delay: Option<Duration>,
    fail_every: Option<usize>,
    always_fail: bool,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self {
            delay: None,
            fail_every: None,
            always_fail: false,
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchJson for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_json(&self, _uri: &str) -> Result<Value, FetchError> {
        let count = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail = self.always_fail
            || self
                .fail_every
                .is_some_and(|n| n > 0 && count % n == 0);
        if fail {
            Err(FetchError::Status {
                status: 500,
                body: json!("boom"),
            })
        } else {
            Ok(json!({"x": 1}))
        }
    }
}

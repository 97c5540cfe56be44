//! loadknob-fetch: HTTP transport for loadknob workers
//!
//! Provides [`HttpJsonFetcher`], the reqwest implementation of
//! [`loadknob_core::FetchJson`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;

pub use http::{HttpFetcherConfig, HttpFetcherError, HttpJsonFetcher};

#[cfg(test)]
mod integration_tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use loadknob_core::{EngineBuilder, KnobConfig, Outcome};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_engine_drives_http_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "world"})))
            .mount(&server)
            .await;

        let engine = EngineBuilder::new()
            .config(KnobConfig::new(100, 2, format!("{}/ok.json", server.uri())))
            .fetcher(Arc::new(HttpJsonFetcher::with_defaults().unwrap()))
            .build()
            .unwrap();

        engine.start();
        tokio::time::sleep(Duration::from_millis(450)).await;
        engine.stop();
        engine.drain().await;

        let stats = engine.stats();
        assert!(stats.call_count >= 2, "only {} calls", stats.call_count);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.response_count, stats.call_count);

        for record in engine.responses() {
            assert_eq!(record.outcome, Outcome::Success(json!({"hello": "world"})));
        }

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), stats.call_count);
        for request in &requests {
            assert!(request.url.query_pairs().any(|(k, _)| k == "_"));
        }
        let distinct: HashSet<_> = requests.iter().map(|r| r.url.to_string()).collect();
        assert!(distinct.len() > 1);
    }

    #[tokio::test]
    async fn test_engine_counts_http_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "missing"})))
            .mount(&server)
            .await;

        let engine = EngineBuilder::new()
            .config(KnobConfig::new(100, 1, format!("{}/missing.json", server.uri())))
            .fetcher(Arc::new(HttpJsonFetcher::with_defaults().unwrap()))
            .build()
            .unwrap();

        engine.start();
        tokio::time::sleep(Duration::from_millis(350)).await;
        engine.stop();
        engine.drain().await;

        let stats = engine.stats();
        assert!(stats.call_count >= 1);
        assert_eq!(stats.error_count, stats.call_count);

        let first = &engine.responses()[0];
        assert!(first.outcome.is_failure());
        assert_eq!(first.outcome.payload()["status"], 404);
        assert_eq!(first.outcome.payload()["body"]["error"], "missing");
    }
}

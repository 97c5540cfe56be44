//! reqwest-backed JSON fetcher

use std::time::Duration;

use async_trait::async_trait;
use loadknob_core::{FetchError, FetchJson};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde_json::Value;

/// Errors raised while constructing an [`HttpJsonFetcher`]
#[derive(Debug, thiserror::Error)]
pub enum HttpFetcherError {
    /// Base URL could not be parsed
    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// reqwest refused the client settings
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Settings for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Base relative target URIs are resolved against
    pub base_url: Option<String>,

    /// Whole-request timeout; none by default
    pub request_timeout: Option<Duration>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("loadknob/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpFetcherConfig {
    /// Resolve relative target URIs against `base_url`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bound each request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Issues GET requests and decodes JSON bodies
///
/// Never retries. Connections are pooled by the reqwest client, responses
/// are not cached.
#[derive(Debug, Clone)]
pub struct HttpJsonFetcher {
    client: Client,
    base_url: Option<Url>,
}

impl HttpJsonFetcher {
    /// Create a fetcher with the given settings
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client cannot
    /// be built.
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, HttpFetcherError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|url| {
                Url::parse(url).map_err(|source| HttpFetcherError::InvalidBaseUrl {
                    url: url.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Create a fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn with_defaults() -> Result<Self, HttpFetcherError> {
        Self::new(&HttpFetcherConfig::default())
    }

    /// Base URL relative targets resolve against, if any
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn resolve(&self, uri: &str) -> Result<Url, FetchError> {
        let resolved = match &self.base_url {
            Some(base) => base.join(uri),
            None => Url::parse(uri),
        };
        resolved.map_err(|e| FetchError::Transport(format!("invalid URI {uri}: {e}")))
    }
}

#[async_trait]
impl FetchJson for HttpJsonFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_json(&self, uri: &str) -> Result<Value, FetchError> {
        let url = self.resolve(uri)?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            tracing::trace!(status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(describe(&e)))?;

        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Flatten a reqwest error and its causes into one line
fn describe(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

//! Builder pattern for Engine construction

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::KnobConfig;
use crate::error::{Error, Result};
use crate::issuer::RequestIssuer;
use crate::traits::FetchJson;

use super::executor::Engine;

/// Builder for creating an Engine with proper configuration
///
/// # Example
///
/// ```ignore
/// let engine = EngineBuilder::new()
///     .config(KnobConfig::new(100, 3, "http://127.0.0.1:8080/ok.json"))
///     .fetcher(Arc::new(HttpJsonFetcher::new()?))
///     .build()?;
///
/// engine.start();
/// ```
pub struct EngineBuilder {
    config: KnobConfig,
    defaults: Option<KnobConfig>,
    fetcher: Option<Arc<dyn FetchJson>>,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    /// Create a new engine builder with default configuration
    pub fn new() -> Self {
        Self {
            config: KnobConfig::default(),
            defaults: None,
            fetcher: None,
            runtime: None,
        }
    }

    /// Set the initial configuration
    pub fn config(mut self, config: KnobConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the configuration `reset` restores (built-in defaults if unset)
    pub fn defaults(mut self, defaults: KnobConfig) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Set the fetch capability
    pub fn fetcher(mut self, fetcher: Arc<dyn FetchJson>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Spawn workers on this runtime instead of the current one
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns an error if no fetcher is set, if either configuration fails
    /// validation, or if no runtime was given and none is current.
    pub fn build(self) -> Result<Engine> {
        let fetcher = self.fetcher.ok_or_else(|| Error::missing("fetcher"))?;

        self.config.validate()?;
        let defaults = self.defaults.unwrap_or_default();
        defaults.validate()?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?,
        };

        Ok(Engine::new(
            self.config,
            defaults,
            RequestIssuer::new(fetcher),
            runtime,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types for loadknob-core

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected by validation
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A builder was finalized without a required component
    #[error("missing required component: {0}")]
    MissingComponent(&'static str),

    /// No tokio runtime was available to spawn workers on
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}

impl Error {
    /// Shorthand for [`Error::MissingComponent`]
    pub fn missing(component: &'static str) -> Self {
        Error::MissingComponent(component)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

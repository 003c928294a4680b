//! Error types for svcwrap

use thiserror::Error;

/// Boxed error returned by hosted applications and service registrars
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for svcwrap
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to start application for service '{service}': {source}")]
    StartApplication {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to stop application for service '{service}': {source}")]
    StopApplication {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("Application run failed for service '{service}': {source}")]
    RunApplication {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("Service '{service}' has already been run")]
    AlreadyRun { service: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Name of the service the error belongs to, if it is a lifecycle error
    pub fn service(&self) -> Option<&str> {
        match self {
            Error::StartApplication { service, .. }
            | Error::StopApplication { service, .. }
            | Error::RunApplication { service, .. }
            | Error::AlreadyRun { service } => Some(service),
            _ => None,
        }
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// madj-common/src/error.rs
use std::sync::Arc;

use thiserror::Error;

/// Every variant here is fatal for the step that produced it. Degraded-but-continuable
/// conditions (a stale source file, a browser that would not open) are reported through the
/// step's report type instead of through this enum.
#[derive(Error, Debug, Clone)]
pub enum MadjError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("No usable Python interpreter found: {0}")]
    NoInterpreter(String),

    #[error("Failed to create runtime environment: {0}")]
    EnvironmentCreate(String),

    #[error("Dependency installation failed: {0}")]
    DependencyInstall(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Checksum Mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Launch Error: {0}")]
    Launch(String),

    #[error("Shortcut Error: {0}")]
    Shortcut(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for MadjError {
    fn from(err: std::io::Error) -> Self {
        MadjError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for MadjError {
    fn from(err: reqwest::Error) -> Self {
        MadjError::Http(Arc::new(err))
    }
}

impl From<toml::de::Error> for MadjError {
    fn from(err: toml::de::Error) -> Self {
        MadjError::Toml(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, MadjError>;

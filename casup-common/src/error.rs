use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CasupError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Catalog Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Glob Pattern Error: {0}")]
    Pattern(#[from] Arc<glob::PatternError>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Command '{0}' timed out after {1:?}")]
    CommandTimeout(String, Duration),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for CasupError {
    fn from(err: std::io::Error) -> Self {
        CasupError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for CasupError {
    fn from(err: serde_json::Error) -> Self {
        CasupError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for CasupError {
    fn from(err: toml::de::Error) -> Self {
        CasupError::Toml(Arc::new(err))
    }
}

impl From<glob::PatternError> for CasupError {
    fn from(err: glob::PatternError) -> Self {
        CasupError::Pattern(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CasupError>;

/// Why a single artifact upload did not produce a digest.
///
/// These never abort a run: the driver logs them and leaves the artifact out
/// of the manifest.
#[derive(Error, Debug, Clone)]
pub enum UploadFailure {
    #[error("failed to stage artifact: {0}")]
    Staging(String),

    #[error("failed to run uploader: {0}")]
    Exec(String),

    #[error("uploader exited unsuccessfully ({0})")]
    NonZeroExit(String),

    #[error("uploader timed out after {0:?}")]
    Timeout(Duration),

    #[error("no digest was dumped, the upload may have failed")]
    EmptyDigest,
}

impl From<CasupError> for UploadFailure {
    fn from(err: CasupError) -> Self {
        match err {
            CasupError::CommandTimeout(_, after) => UploadFailure::Timeout(after),
            other => UploadFailure::Exec(other.to_string()),
        }
    }
}

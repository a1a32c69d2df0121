//! Error types for the link validator

use std::path::PathBuf;
use thiserror::Error;

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Pass-level validator errors.
///
/// Per-record and per-reference problems are *not* errors: malformed records
/// become [`crate::store::LoadIssue`] entries and bad references become
/// findings. Only structural problems that prevent a run from starting at
/// all surface here.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("source root not found or unreadable: {0}")]
    SourceNotFound(PathBuf),

    #[error("no entity records found in source: {0}")]
    NoRecords(String),

    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("invalid configuration value: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

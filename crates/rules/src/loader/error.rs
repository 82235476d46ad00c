//! Error types and load result structures for the criteria loader and service.

use std::path::PathBuf;

use crate::cache::CacheError;

/// Errors surfaced to callers of the loader and the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Criteria validation error (blocking findings, duplicate ids).
    #[error("Validation error: {0}")]
    Validation(String),

    /// No criteria with this id is loaded.
    #[error("criteria '{0}' not found")]
    CriteriaNotFound(String),

    /// The criteria exists but `metadata.enabled` is false.
    #[error("criteria '{0}' is disabled")]
    CriteriaDisabled(String),

    /// Evaluation cache backend failure.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for loader and service operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Outcome of loading a single criteria file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Criteria was successfully loaded.
    Loaded { criteria_id: String },
    /// File was skipped (dotfile, non-YAML, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

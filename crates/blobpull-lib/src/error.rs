use crate::storage::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobPullError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid arguments: {details}")]
    Usage { details: String },

    #[error("Failed to read path list from {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    #[error("Invalid transform rules: {details}")]
    InvalidTransformRules { details: String },

    #[error("Output directory creation failed at {path}: {reason}")]
    OutputDirectoryCreation { path: PathBuf, reason: String },

    #[error("Aborting, storage is unreachable: {0}")]
    Storage(#[from] FetchError),

    #[error("{failed} of {total} downloads failed")]
    TargetsFailed { failed: usize, total: usize },
}

use thiserror::Error;

/// A blob path split into the container that holds it and the path inside
/// that container.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedTarget {
    /// Never empty.
    pub container: String,
    /// Never empty, never starts with the container segment.
    pub blob_path: String,
    /// The path exactly as the user supplied it.
    pub source_raw_path: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("cannot infer container from '{path}': path has no '/' separator")]
    NoSeparator { path: String },

    #[error("cannot infer container from '{path}': container segment is empty")]
    EmptyContainer { path: String },

    #[error("'{path}' does not name a blob")]
    EmptyBlobPath { path: String },
}

impl ResolutionError {
    pub fn path(&self) -> &str {
        match self {
            ResolutionError::NoSeparator { path }
            | ResolutionError::EmptyContainer { path }
            | ResolutionError::EmptyBlobPath { path } => path,
        }
    }
}

mod operator;

pub use operator::{OpendalBlobStore, classify_error};

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// The contents of one blob, in the order the store hands them out.
pub type BlobChunks = BoxStream<'static, Result<opendal::Buffer, FetchError>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("blob does not exist on container ({container}): '{blob_path}'")]
    NotFound {
        container: String,
        blob_path: String,
    },

    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    #[error("connection failed: {reason}")]
    Connection { reason: String },

    #[error("error when downloading blob on container ({container}): '{blob_path}': {reason}")]
    Other {
        container: String,
        blob_path: String,
        reason: String,
    },
}

impl FetchError {
    /// Credentials and the connection are shared by every target, so these
    /// failures would repeat for everything that follows.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Auth { .. } | FetchError::Connection { .. })
    }
}

/// Read access to blobs, addressed by container and path inside it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Starts reading a blob. Failures may surface here or from any chunk.
    async fn open_blob(&self, container: &str, blob_path: &str) -> Result<BlobChunks, FetchError>;
}

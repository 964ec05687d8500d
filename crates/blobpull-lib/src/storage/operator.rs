use super::{BlobChunks, BlobStore, FetchError};
use async_trait::async_trait;
use futures::StreamExt;
use opendal::layers::TracingLayer;
use opendal::services::Azblob;
use opendal::{ErrorKind, Operator};
use std::collections::HashMap;

fn build_azblob_operator(connection_string: &str, container: &str) -> Result<Operator, FetchError> {
    // The connection string carries the account name, key and endpoint; the
    // container is the operator's root namespace.
    let builder = Azblob::from_connection_string(connection_string)
        .map_err(|e| classify_error(e, container, ""))?
        .container(container);

    let op = Operator::new(builder)
        .map_err(|e| classify_error(e, container, ""))?
        .layer(TracingLayer)
        .finish();
    Ok(op)
}

/// [`BlobStore`] backed by one OpenDAL operator per container.
#[derive(Clone, Debug, Default)]
pub struct OpendalBlobStore {
    operators: HashMap<String, Operator>,
}

impl OpendalBlobStore {
    pub fn from_operators(operators: HashMap<String, Operator>) -> Self {
        Self { operators }
    }

    /// Builds an Azure Blob Storage operator for each distinct container up
    /// front so every download reuses the same client.
    pub fn azure<'a>(
        connection_string: &str,
        containers: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, FetchError> {
        let mut operators = HashMap::new();
        tracing::debug!("Creating operators...");
        for container in containers {
            if let std::collections::hash_map::Entry::Vacant(e) =
                operators.entry(container.to_string())
            {
                e.insert(build_azblob_operator(connection_string, container)?);
            }
        }
        Ok(Self { operators })
    }
}

#[async_trait]
impl BlobStore for OpendalBlobStore {
    async fn open_blob(&self, container: &str, blob_path: &str) -> Result<BlobChunks, FetchError> {
        let op = self
            .operators
            .get(container)
            .ok_or_else(|| FetchError::Other {
                container: container.to_string(),
                blob_path: blob_path.to_string(),
                reason: "no storage client configured for this container".to_string(),
            })?;

        let stream = op
            .reader(blob_path)
            .await
            .map_err(|e| classify_error(e, container, blob_path))?
            .into_stream(..)
            .await
            .map_err(|e| classify_error(e, container, blob_path))?;

        let container = container.to_string();
        let blob_path = blob_path.to_string();
        Ok(stream
            .map(move |chunk| chunk.map_err(|e| classify_error(e, &container, &blob_path)))
            .boxed())
    }
}

/// Maps an OpenDAL error onto the failure classes the downloader acts on.
///
/// Azure reports rejected credentials as 403, which OpenDAL surfaces as
/// `PermissionDenied`. A temporary error only counts as a lost connection when
/// the request never got a reply: those carry the transport error as their
/// source. Temporary errors parsed from a server reply (5xx, throttling) fail
/// the single blob.
pub fn classify_error(err: opendal::Error, container: &str, blob_path: &str) -> FetchError {
    match err.kind() {
        ErrorKind::NotFound => FetchError::NotFound {
            container: container.to_string(),
            blob_path: blob_path.to_string(),
        },
        ErrorKind::PermissionDenied | ErrorKind::ConfigInvalid => FetchError::Auth {
            reason: err.to_string(),
        },
        _ if err.is_temporary() && std::error::Error::source(&err).is_some() => {
            FetchError::Connection {
                reason: err.to_string(),
            }
        }
        _ => FetchError::Other {
            container: container.to_string(),
            blob_path: blob_path.to_string(),
            reason: err.to_string(),
        },
    }
}

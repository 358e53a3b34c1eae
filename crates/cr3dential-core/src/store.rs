//! Content-addressed storage of DID documents and credentials.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// An error relating to the content-addressed store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable or upload rejected.
    #[error("Upload failed: {0}")]
    Upload(String),
    /// Store unreachable or content missing.
    #[error("Fetch failed for {uri}: {reason}")]
    Fetch { uri: String, reason: String },
    /// Payload could not be serialized.
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn fetch(uri: &str, reason: impl ToString) -> Self {
        StoreError::Fetch {
            uri: uri.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Content id and retrieval URI of an uploaded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub content_id: String,
    pub uri: String,
}

/// A content-addressed network that returns a content identifier for each upload.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Uploads a payload under a human readable name and returns its content id.
    async fn upload(&self, payload: Vec<u8>, name: &str) -> Result<String, StoreError>;

    /// Fetches the payload at a retrieval URI.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, StoreError>;

    /// Retrieval URI of a content id, `<gateway-base>/<contentId>`.
    fn retrieval_uri(&self, content_id: &str) -> String;
}

/// Uploads the canonical JSON serialization of `value`.
pub async fn upload_json<T: Serialize + Sync + ?Sized>(
    store: &dyn ContentStore,
    value: &T,
    name: &str,
) -> Result<StoredObject, StoreError> {
    let payload = serde_jcs::to_vec(value)?;
    let content_id = store.upload(payload, name).await?;
    Ok(StoredObject {
        uri: store.retrieval_uri(&content_id),
        content_id,
    })
}

/// Last path segment of a retrieval URI.
pub fn content_id_from_uri(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(_, content_id)| content_id)
        .filter(|content_id| !content_id.is_empty())
}

/// Joins a gateway base URL and a content id.
pub fn join_gateway(gateway: &str, content_id: &str) -> String {
    format!("{}/{content_id}", gateway.trim_end_matches('/'))
}

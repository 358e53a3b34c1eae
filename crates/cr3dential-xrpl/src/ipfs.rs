//! IPFS node HTTP API as the content-addressed store.
use async_trait::async_trait;
use cr3dential_core::store::{content_id_from_uri, join_gateway, ContentStore, StoreError};
use futures::TryStreamExt;
use ipfs_api_backend_hyper::{IpfsApi, IpfsClient, TryFromUri};
use log::{debug, info};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

/// Adds to and reads from an IPFS node; retrieval URIs point at a gateway.
#[derive(Clone)]
pub struct IpfsNodeStore {
    client: IpfsClient,
    gateway_url: String,
    timeout: Duration,
}

impl IpfsNodeStore {
    pub fn new(api_url: &str, gateway_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = IpfsClient::from_str(api_url)
            .map_err(|err| StoreError::Upload(format!("invalid IPFS API URL {api_url}: {err}")))?;
        Ok(Self {
            client,
            gateway_url: gateway_url.to_owned(),
            timeout,
        })
    }
}

/// Retrieves the content with the given CID from an IPFS node.
pub async fn query_ipfs(
    cid: &str,
    client: &IpfsClient,
) -> Result<Vec<u8>, ipfs_api_backend_hyper::Error> {
    client
        .cat(cid)
        .map_ok(|chunk| chunk.to_vec())
        .try_concat()
        .await
}

#[async_trait]
impl ContentStore for IpfsNodeStore {
    async fn upload(&self, payload: Vec<u8>, name: &str) -> Result<String, StoreError> {
        let added = timeout(self.timeout, self.client.add(Cursor::new(payload)))
            .await
            .map_err(|_| StoreError::Upload(format!("adding {name} timed out")))?
            .map_err(|err| StoreError::Upload(err.to_string()))?;
        info!("Added {name} as {}", added.hash);
        Ok(added.hash)
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, StoreError> {
        let cid = content_id_from_uri(uri)
            .ok_or_else(|| StoreError::fetch(uri, "no content id in URI"))?;
        debug!("Fetching {cid} from IPFS node");
        timeout(self.timeout, query_ipfs(cid, &self.client))
            .await
            .map_err(|_| StoreError::fetch(uri, "timed out"))?
            .map_err(|err| StoreError::fetch(uri, err))
    }

    fn retrieval_uri(&self, content_id: &str) -> String {
        join_gateway(&self.gateway_url, content_id)
    }
}

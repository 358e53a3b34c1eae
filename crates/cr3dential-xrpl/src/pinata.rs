//! Pinata pinning service as the content-addressed store.
use async_trait::async_trait;
use cr3dential_core::store::{join_gateway, ContentStore, StoreError};
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Environment variable holding the Pinata API token.
pub const PINATA_JWT: &str = "PINATA_JWT";

const PIN_FILE_PATH: &str = "pinning/pinFileToIPFS";

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Uploads through `pinFileToIPFS` and fetches through a public gateway.
#[derive(Clone)]
pub struct PinataStore {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    jwt: String,
}

impl std::fmt::Debug for PinataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataStore")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .finish_non_exhaustive()
    }
}

impl PinataStore {
    pub fn new(
        api_url: &str,
        gateway_url: &str,
        jwt: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Upload(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_owned(),
            gateway_url: gateway_url.to_owned(),
            jwt: jwt.to_owned(),
        })
    }

    /// Store authenticated with the token in `$PINATA_JWT`.
    pub fn from_env(api_url: &str, gateway_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let jwt = std::env::var(PINATA_JWT)
            .map_err(|_| StoreError::Upload(format!("{PINATA_JWT} is not set")))?;
        Self::new(api_url, gateway_url, &jwt, timeout)
    }

    fn upload_form(payload: Vec<u8>, name: &str) -> Result<Form, StoreError> {
        let part = Part::bytes(payload)
            .file_name(name.to_owned())
            .mime_str("application/json")
            .map_err(|err| StoreError::Upload(err.to_string()))?;
        Ok(Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": name }).to_string()))
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    async fn upload(&self, payload: Vec<u8>, name: &str) -> Result<String, StoreError> {
        let url = format!("{}/{PIN_FILE_PATH}", self.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.jwt)
            .multipart(Self::upload_form(payload, name)?)
            .send()
            .await
            .map_err(|err| StoreError::Upload(format!("{url}: {err}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Upload(format!("{url}: HTTP {status}: {body}")));
        }
        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|err| StoreError::Upload(format!("unexpected pin response: {err}")))?;
        info!("Pinned {name} as {}", pinned.ipfs_hash);
        Ok(pinned.ipfs_hash)
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, StoreError> {
        debug!("Fetching {uri}");
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|err| StoreError::fetch(uri, err))?;
        if !response.status().is_success() {
            return Err(StoreError::fetch(
                uri,
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(response
            .bytes()
            .await
            .map_err(|err| StoreError::fetch(uri, err))?
            .to_vec())
    }

    fn retrieval_uri(&self, content_id: &str) -> String {
        join_gateway(&self.gateway_url, content_id)
    }
}

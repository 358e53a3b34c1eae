//! Cr3dential XRPL configuration types and utilities.
use crate::ipfs::IpfsNodeStore;
use crate::pinata::PinataStore;
use cr3dential_core::ledger::NetworkConfig;
use cr3dential_core::store::{ContentStore, StoreError};
use cr3dential_core::CR3DENTIAL_CONFIG;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";
const DEFAULT_IPFS_API_URL: &str = "http://127.0.0.1:5001";

/// Content-addressed store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Pinata,
    Ipfs,
}

/// XRPL and storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct XrplConfig {
    /// JSON-RPC URL overriding the network default, e.g. a local rippled.
    pub rpc_url: Option<String>,
    pub store: StoreBackend,
    pub pinata_api_url: String,
    /// Gateway base of retrieval URIs.
    pub gateway_url: String,
    pub ipfs_api_url: String,
    /// Issuer account expected to match the configured seed.
    pub issuer_account: Option<String>,
}

impl std::fmt::Display for XrplConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl Default for XrplConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            store: StoreBackend::default(),
            pinata_api_url: DEFAULT_PINATA_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            ipfs_api_url: DEFAULT_IPFS_API_URL.to_string(),
            issuer_account: None,
        }
    }
}

impl XrplConfig {
    /// Applies the RPC URL override, if any.
    pub fn network_config(&self, network: NetworkConfig) -> NetworkConfig {
        match &self.rpc_url {
            Some(rpc_url) => network.with_rpc_url(rpc_url),
            None => network,
        }
    }

    /// Builds the configured content store. Pinata reads its token from the environment.
    pub fn content_store(&self, timeout: Duration) -> Result<Arc<dyn ContentStore>, StoreError> {
        Ok(match self.store {
            StoreBackend::Pinata => Arc::new(PinataStore::from_env(
                &self.pinata_api_url,
                &self.gateway_url,
                timeout,
            )?),
            StoreBackend::Ipfs => Arc::new(IpfsNodeStore::new(
                &self.ipfs_api_url,
                &self.gateway_url,
                timeout,
            )?),
        })
    }
}

lazy_static! {
    /// Lazy static reference to XRPL configuration loaded from `cr3dential_config.toml`.
    pub static ref XRPL_CONFIG: XrplConfig = parse_toml(
        &fs::read_to_string(std::env::var(CR3DENTIAL_CONFIG).expect("CR3DENTIAL_CONFIG is not set"))
        .expect("Error reading cr3dential_config.toml"));
}

/// Parses and returns XRPL configuration.
fn parse_toml(toml_str: &str) -> XrplConfig {
    toml::from_str::<Config>(toml_str)
        .expect("Error parsing cr3dential_config.toml")
        .xrpl
}

/// Gets `cr3dential-xrpl` configuration variables.
pub fn xrpl_config() -> &'static XRPL_CONFIG {
    &XRPL_CONFIG
}

/// Wrapper struct for parsing the `xrpl` config table.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct Config {
    /// XRPL configuration data.
    #[serde(default)]
    xrpl: XrplConfig,
}

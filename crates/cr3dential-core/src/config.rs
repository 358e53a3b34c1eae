//! Cr3dential core configuration types and utilities.
use crate::anchor::FinalityConfig;
use crate::catalog::{CatalogError, CredentialCatalog};
use crate::directory::{DirectoryError, StaticIssuerDirectory};
use crate::ledger::{Network, NetworkConfig};
use crate::CR3DENTIAL_CONFIG;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SETTLE_DELAY_MS: u64 = 5_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_FINALITY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// An error relating to loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{CR3DENTIAL_CONFIG} environment variable is not set.")]
    MissingConfigPath,
    #[error("Error reading config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Error parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Core configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreConfig {
    /// Default ledger network.
    pub network: Network,
    /// Whether issued credentials are anchored from the issuer account.
    pub anchor_credentials: bool,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub finality_timeout_ms: u64,
    /// Bound on each ledger and store request.
    pub request_timeout_ms: u64,
    /// Credential catalog JSON file, built-in catalog if unset.
    pub catalog_path: Option<String>,
    /// Issuer directory JSON file, built-in issuers if unset.
    pub issuers_path: Option<String>,
}

impl std::fmt::Display for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            anchor_credentials: false,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            finality_timeout_ms: DEFAULT_FINALITY_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            catalog_path: None,
            issuers_path: None,
        }
    }
}

impl CoreConfig {
    /// Reads the `[core]` table of a config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        parse_toml(&fs::read_to_string(path)?)
    }

    /// Reads the `[core]` table of the file named by `$CR3DENTIAL_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CR3DENTIAL_CONFIG).map_err(|_| ConfigError::MissingConfigPath)?;
        Self::from_path(path)
    }

    pub fn finality(&self) -> FinalityConfig {
        FinalityConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.finality_timeout_ms),
        }
    }

    /// Network settings of the default network.
    pub fn network_config(&self) -> NetworkConfig {
        self.network_config_for(self.network)
    }

    pub fn network_config_for(&self, network: Network) -> NetworkConfig {
        NetworkConfig::new(network)
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    pub fn catalog(&self) -> Result<CredentialCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => CredentialCatalog::from_path(path),
            None => Ok(CredentialCatalog::builtin()),
        }
    }

    pub fn directory(&self) -> Result<StaticIssuerDirectory, DirectoryError> {
        match &self.issuers_path {
            Some(path) => StaticIssuerDirectory::from_path(path),
            None => StaticIssuerDirectory::builtin(),
        }
    }
}

lazy_static! {
    /// Lazy static reference to core configuration loaded from `cr3dential_config.toml`.
    pub static ref CORE_CONFIG: CoreConfig =
        CoreConfig::from_env().expect("Error loading cr3dential_config.toml");
}

/// Parses and returns core configuration.
fn parse_toml(toml_str: &str) -> Result<CoreConfig, ConfigError> {
    Ok(toml::from_str::<Config>(toml_str)?.core)
}

/// Gets `cr3dential-core` configuration variables.
pub fn core_config() -> &'static CORE_CONFIG {
    &CORE_CONFIG
}

/// Wrapper struct for parsing the `core` config table.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct Config {
    /// Core configuration data.
    #[serde(default)]
    core: CoreConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_deserialize() {
        let config_string = r#"
        [core]
        network = "devnet"
        anchor_credentials = true
        settle_delay_ms = 100
        catalog_path = "/etc/cr3dential/catalog.json"

        [non_core]
        key = "value"
        "#;

        let config: CoreConfig = parse_toml(config_string).unwrap();
        assert_eq!(
            config,
            CoreConfig {
                network: Network::Devnet,
                anchor_credentials: true,
                settle_delay_ms: 100,
                catalog_path: Some("/etc/cr3dential/catalog.json".to_string()),
                ..CoreConfig::default()
            }
        );
        assert_eq!(config.finality().settle_delay, Duration::from_millis(100));
        assert_eq!(config.finality().timeout, Duration::from_secs(30));
        let network = config.network_config();
        assert_eq!(network.network, Network::Devnet);
        assert_eq!(network.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_table() {
        assert_eq!(
            parse_toml("[http]\nport = 8081\n").unwrap(),
            CoreConfig::default()
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[core]\nnetwork = \"mainnet\"").unwrap();
        let config = CoreConfig::from_path(file.path()).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert!(config.catalog().unwrap().get("xrpl-training").is_some());

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[core]\nnetwork = \"moonnet\"").unwrap();
        assert!(matches!(
            CoreConfig::from_path(bad.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[core]\nnetwork = \"testnet\"\nrequest_timeout_ms = 500").unwrap();
        std::env::set_var(CR3DENTIAL_CONFIG, file.path());
        let config = CoreConfig::from_env().unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(
            config.network_config().request_timeout,
            Duration::from_millis(500)
        );

        std::env::remove_var(CR3DENTIAL_CONFIG);
        assert!(matches!(
            CoreConfig::from_env(),
            Err(ConfigError::MissingConfigPath)
        ));
    }

    #[tokio::test]
    async fn test_builtin_directory() {
        use crate::directory::IssuerDirectory;
        let directory = CoreConfig::default().directory().unwrap();
        assert!(!directory.list_issuers().await.unwrap().is_empty());
    }
}

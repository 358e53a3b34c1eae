//! Cr3dential HTTP configuration types and utilities.
use cr3dential_core::CR3DENTIAL_CONFIG;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 8081;

/// HTTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HTTPConfig {
    /// Host address for server.
    pub host: IpAddr,
    /// Port for server.
    pub port: u16,
}

impl std::fmt::Display for HTTPConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl Default for HTTPConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
        }
    }
}

impl HTTPConfig {
    /// Provides `SocketAddr` of server config address.
    pub fn to_socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

lazy_static! {
    /// Lazy static reference to HTTP configuration loaded from `cr3dential_config.toml`.
    pub static ref HTTP_CONFIG: HTTPConfig = parse_toml(
        &fs::read_to_string(std::env::var(CR3DENTIAL_CONFIG).expect("CR3DENTIAL_CONFIG is not set"))
        .expect("Error reading cr3dential_config.toml"));
}

/// Parses and returns HTTP configuration.
fn parse_toml(toml_str: &str) -> HTTPConfig {
    toml::from_str::<Config>(toml_str)
        .expect("Error parsing cr3dential_config.toml")
        .http
}

/// Gets `cr3dential-http` configuration variables.
pub fn http_config() -> &'static HTTP_CONFIG {
    &HTTP_CONFIG
}

/// Wrapper struct for parsing the `http` config table.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct Config {
    /// HTTP configuration data.
    http: HTTPConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize() {
        let config_string = r#"
        [http]
        host = "127.0.0.1"
        port = 8081

        [non_http]
        key = "value"
        "#;

        let config: HTTPConfig = parse_toml(config_string);
        assert_eq!(config, HTTPConfig::default());
        assert_eq!(
            config.to_socket_address(),
            "127.0.0.1:8081".parse::<SocketAddr>().unwrap()
        );
    }
}

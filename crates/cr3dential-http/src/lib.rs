//! HTTP API for requesting, claiming and listing credentials and for DID document updates.
pub mod config;
pub mod credentials;
#[cfg(test)]
pub(crate) mod data;
pub mod diddocuments;
pub mod errors;
pub mod handlers;
pub mod issuers;
pub mod middleware;
pub mod server;
pub mod state;

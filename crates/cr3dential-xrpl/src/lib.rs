//! XRPL ledger and IPFS storage backends.
pub mod client;
pub mod config;
pub mod ipfs;
pub mod pinata;
pub mod rpc;
pub mod signer;

pub use client::{XrplClient, XrplConnector};
pub use signer::RpcSigner;

//! Core traits and protocol logic (ledger and storage independent).
pub mod anchor;
pub mod catalog;
pub mod claim;
pub mod config;
pub mod credential;
#[cfg(test)]
pub(crate) mod data;
pub mod did;
pub mod directory;
pub mod document;
pub mod issuer;
pub mod ledger;
pub mod local;
pub mod memory;
#[cfg(test)]
pub(crate) mod mocks;
pub mod offer;
pub mod resolver;
pub mod store;
pub mod updater;
pub mod utils;

/// Environment variable name for the Cr3dential data directory (local credential cache).
pub const CR3DENTIAL_DATA: &str = "CR3DENTIAL_DATA";

/// Environment variable name for the Cr3dential config file.
pub const CR3DENTIAL_CONFIG: &str = "CR3DENTIAL_CONFIG";

/// JSON-LD context of DID documents.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// JSON-LD contexts of issued verifiable credentials, in order.
pub const CREDENTIAL_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/2018/credentials/v1",
    "https://www.w3.org/2018/credentials/examples/v1",
];

/// Fragment of the verification method used for credential proofs.
pub const DEFAULT_KEY_FRAGMENT: &str = "keys-1";

/// Verification method type of ledger account keys.
pub const VERIFICATION_KEY_TYPE: &str = "EcdsaSecp256k1VerificationKey2019";

//! Issuer directory: metadata about known credential issuers.
use crate::did::Did;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// An error relating to the issuer directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Directory could not be reached or read.
    #[error("Issuer directory unavailable: {0}")]
    Unavailable(String),
    /// Directory contents could not be deserialized.
    #[error("Failed to deserialize issuer directory: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        DirectoryError::Unavailable(err.to_string())
    }
}

/// Public metadata of a credential issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<Did>,
    pub name: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

/// Lookup of issuer metadata.
#[async_trait]
pub trait IssuerDirectory: Send + Sync {
    /// Lists all known issuers.
    async fn list_issuers(&self) -> Result<Vec<IssuerMetadata>, DirectoryError>;

    /// Finds the issuer with the given DID.
    async fn find_issuer(&self, did: &Did) -> Result<Option<IssuerMetadata>, DirectoryError> {
        Ok(self
            .list_issuers()
            .await?
            .into_iter()
            .find(|issuer| issuer.did.as_ref() == Some(did)))
    }
}

/// Issuer directory backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticIssuerDirectory {
    issuers: Vec<IssuerMetadata>,
}

impl StaticIssuerDirectory {
    pub fn new(issuers: Vec<IssuerMetadata>) -> Self {
        Self { issuers }
    }

    /// Issuers known to the platform.
    pub fn builtin() -> Result<Self, DirectoryError> {
        Ok(Self::new(serde_json::from_str(BUILTIN_ISSUERS_JSON)?))
    }

    /// Loads issuers from a JSON array.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        Ok(Self::new(serde_json::from_str(&std::fs::read_to_string(
            path,
        )?)?))
    }
}

#[async_trait]
impl IssuerDirectory for StaticIssuerDirectory {
    async fn list_issuers(&self) -> Result<Vec<IssuerMetadata>, DirectoryError> {
        Ok(self.issuers.clone())
    }
}

const BUILTIN_ISSUERS_JSON: &str = r#"[
    {
        "did": "did:xrpl:1:rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe",
        "name": "42",
        "description": "42 is a future-proof computer science training to educate the next generation of software engineers.",
        "image": "/images/42.webp",
        "url": "https://42.fr/"
    },
    {
        "did": "did:xrpl:1:rEABey99Sy7nohSEp9hWxjHMjUDSsBxeXi",
        "name": "EasyA",
        "description": "EasyA teaches you how to build with top blockchains and deploy dApps faster than you can say \"WAGMI\"!",
        "image": "/images/easya.jpg",
        "url": "https://www.easya.io"
    },
    {
        "did": "did:xrpl:1:rUhRUukKmFk18Tuujc5hiT2iQ6NdBBjo7x",
        "name": "Futureverse",
        "description": "Building the future of digital experiences",
        "image": "/images/futureverse.png",
        "url": "https://www.futureverse.com"
    },
    {
        "did": "did:xrpl:1:r4JWSRAf1wSojHg7JEf6H9JT4eJ6tajHui",
        "name": "XRPL Commons",
        "description": "Building the commons with the XRPL Community",
        "image": "/images/xrpl-commons.webp",
        "url": "https://www.xrpl-commons.org/"
    },
    {
        "did": "did:xrpl:1:rHUy4Vuc4J1sgkijpFt8QvWH9kjhksVP7y",
        "name": "Cr3dential",
        "description": "A universal wallet for managing digital credentials and verifiable claims",
        "image": "/images/cr3dential.webp",
        "url": "https://www.xrpl-commons.org/"
    }
]"#;

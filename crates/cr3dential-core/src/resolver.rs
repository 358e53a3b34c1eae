//! DID resolution: ledger DID record -> content-addressed DID document.
use crate::did::{Did, DidError};
use crate::document::DidDocument;
use crate::ledger::{LedgerClient, LedgerConnector, LedgerError, NetworkConfig, DID_OBJECT_TYPE};
use crate::store::{ContentStore, StoreError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// An error relating to DID resolution.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// DID could not be parsed. Raised before any network call.
    #[error("Invalid DID: {0}")]
    InvalidDid(#[from] DidError),
    /// Ledger unreachable or query failed.
    #[error("Ledger error during resolution: {0}")]
    Ledger(#[from] LedgerError),
    /// Document could not be fetched from the store.
    #[error("Failed to fetch DID document: {0}")]
    Fetch(#[from] StoreError),
    /// Fetched payload is neither JSON nor a byte-array encoded JSON document.
    #[error("Malformed DID document at {uri}: {reason}")]
    MalformedDocument { uri: String, reason: String },
}

/// A fetched DID document tagged with the decode stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedDocument {
    /// Payload was the document JSON.
    Json(DidDocument),
    /// Payload was a JSON byte array of the UTF-8 document.
    ByteArray(DidDocument),
}

impl DecodedDocument {
    pub fn into_document(self) -> DidDocument {
        match self {
            DecodedDocument::Json(document) | DecodedDocument::ByteArray(document) => document,
        }
    }
}

/// Decodes a stored DID document: direct JSON first, then byte-array wrapped UTF-8 JSON.
pub fn decode_document(payload: &[u8]) -> Result<DecodedDocument, String> {
    let json_err = match serde_json::from_slice::<DidDocument>(payload) {
        Ok(document) => return Ok(DecodedDocument::Json(document)),
        Err(err) => err,
    };
    let text = std::str::from_utf8(payload)
        .map_err(|err| format!("{json_err}; payload is not UTF-8: {err}"))?
        .trim();
    let array = if text.starts_with('[') {
        text.to_owned()
    } else {
        format!("[{text}]")
    };
    let bytes: Vec<u8> = serde_json::from_str(&array)
        .map_err(|err| format!("{json_err}; not a byte array: {err}"))?;
    let document_text =
        String::from_utf8(bytes).map_err(|err| format!("byte array is not UTF-8: {err}"))?;
    serde_json::from_str(&document_text)
        .map(DecodedDocument::ByteArray)
        .map_err(|err| format!("byte array is not a DID document: {err}"))
}

/// Decodes a ledger pointer URI stored either as plain text or hex encoded bytes.
pub fn decode_pointer_uri(raw: &str) -> String {
    let (hex_str, prefixed) = match raw.strip_prefix("0x") {
        Some(stripped) => (stripped, true),
        None => (raw, false),
    };
    let looks_hex = !hex_str.is_empty() && hex_str.chars().all(|c| c.is_ascii_hexdigit());
    if !(prefixed || looks_hex) {
        return raw.to_owned();
    }
    match hex::decode(hex_str)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(uri) => uri,
        None => {
            debug!("Pointer {raw} is not hex encoded UTF-8, using as is");
            raw.to_owned()
        }
    }
}

/// A resolved DID document and the URI it was fetched from (`None` if synthesized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub document: DidDocument,
    pub uri: Option<String>,
}

impl Resolution {
    pub fn is_default(&self) -> bool {
        self.uri.is_none()
    }
}

/// Resolves DIDs over an open ledger session.
pub struct DidResolver<'a> {
    ledger: &'a dyn LedgerClient,
    store: &'a dyn ContentStore,
}

impl<'a> DidResolver<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, store: &'a dyn ContentStore) -> Self {
        Self { ledger, store }
    }

    /// Resolves `did`, synthesizing a default document when the account has no DID record.
    pub async fn resolve(&self, did: &Did) -> Result<Resolution, ResolverError> {
        let objects = match self
            .ledger
            .account_objects(did.account(), DID_OBJECT_TYPE)
            .await
        {
            Ok(objects) => objects,
            Err(LedgerError::AccountNotFound(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        let Some(raw_uri) = objects.into_iter().find_map(|object| object.uri) else {
            debug!("No DID record for {did}, synthesizing default document");
            return Ok(Resolution {
                document: DidDocument::synthesize_default(did),
                uri: None,
            });
        };
        let uri = decode_pointer_uri(&raw_uri);
        debug!("Fetching DID document for {did} from {uri}");
        let payload = self.store.fetch(&uri).await?;
        let document = decode_document(&payload)
            .map_err(|reason| ResolverError::MalformedDocument {
                uri: uri.clone(),
                reason,
            })?
            .into_document();
        if document.id != did.to_string() {
            warn!("Document at {uri} has id {} for {did}", document.id);
        }
        Ok(Resolution {
            document,
            uri: Some(uri),
        })
    }
}

/// Resolver that opens and closes a ledger session per resolution.
#[derive(Clone)]
pub struct Resolver {
    connector: Arc<dyn LedgerConnector>,
    store: Arc<dyn ContentStore>,
}

impl Resolver {
    pub fn new(connector: Arc<dyn LedgerConnector>, store: Arc<dyn ContentStore>) -> Self {
        Self { connector, store }
    }

    /// Parses and resolves `did` on `network`.
    pub async fn resolve(
        &self,
        network: &NetworkConfig,
        did: &str,
    ) -> Result<Resolution, ResolverError> {
        let did: Did = did.parse()?;
        self.resolve_did(network, &did).await
    }

    pub async fn resolve_did(
        &self,
        network: &NetworkConfig,
        did: &Did,
    ) -> Result<Resolution, ResolverError> {
        let client = self.connector.connect(network).await?;
        let result = DidResolver::new(client.as_ref(), self.store.as_ref())
            .resolve(did)
            .await;
        if let Err(err) = client.disconnect().await {
            warn!("Ledger disconnect failed: {err}");
        }
        result
    }
}

//! Holder-side claim flow tying issuance, resolution and DID document linking together.
use crate::credential::StoredCredential;
use crate::document::DidDocument;
use crate::issuer::{IssuanceEngine, IssuerError};
use crate::ledger::NetworkConfig;
use crate::local::{LocalStore, LocalStoreError};
use crate::offer::CredentialOffer;
use crate::resolver::{Resolver, ResolverError};
use crate::store::StoreError;
use crate::updater::link_credential;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// An error relating to claiming a credential offer.
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Invalid claim: {0}")]
    Validation(String),
    /// Holder already holds an active credential of this type.
    #[error("Credential {type_key} already claimed by {did}: {uri}")]
    AlreadyClaimed {
        type_key: String,
        did: String,
        uri: String,
    },
    /// Another claim of the same type by the same holder has not finished.
    #[error("Credential {type_key} is already being claimed by {did}.")]
    InProgress { type_key: String, did: String },
    /// Local cache unreadable before anything was uploaded.
    #[error("Local cache error: {0}")]
    Cache(#[source] LocalStoreError),
    #[error("Failed to resolve holder DID document: {0}")]
    Resolution(#[from] ResolverError),
    /// Holder document lacks the key referenced by the credential proof.
    #[error("Verification method {0} not found in holder DID document.")]
    MissingVerificationMethod(String),
    #[error("{0}")]
    Issuance(#[from] IssuerError),
    /// Credential uploaded but the updated DID document was not.
    #[error("Credential uploaded to {credential_uri} but DID document update failed: {source}")]
    Link {
        credential_uri: String,
        #[source]
        source: StoreError,
    },
    /// Credential and DID document uploaded but not cached locally.
    #[error("Credential uploaded to {credential_uri} but local persistence failed: {source}")]
    Persist {
        credential_uri: String,
        document_uri: String,
        #[source]
        source: LocalStoreError,
    },
}

impl ClaimError {
    /// URI of an uploaded credential that the holder's DID document does not reference.
    pub fn orphaned_uri(&self) -> Option<&str> {
        match self {
            ClaimError::Issuance(err) => err.orphaned_uri(),
            ClaimError::Link { credential_uri, .. } => Some(credential_uri),
            ClaimError::Persist { credential_uri, .. } => Some(credential_uri),
            _ => None,
        }
    }
}

/// Outcome of a successful claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub credential: StoredCredential,
    /// Updated holder DID document, to be anchored by the holder.
    pub did_document_url: String,
    pub document: DidDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

type ClaimKey = (String, String);

/// Holds a (holder, type key) pair for the duration of one claim.
struct Reservation {
    key: ClaimKey,
    in_flight: Arc<Mutex<HashSet<ClaimKey>>>,
}

impl Reservation {
    fn acquire(in_flight: &Arc<Mutex<HashSet<ClaimKey>>>, key: ClaimKey) -> Option<Self> {
        let mut pending = in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.insert(key.clone()).then(|| Reservation {
            key,
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}

/// Accepts offers on behalf of holders.
#[derive(Clone)]
pub struct ClaimFlow {
    engine: IssuanceEngine,
    resolver: Resolver,
    local: Arc<LocalStore>,
    in_flight: Arc<Mutex<HashSet<ClaimKey>>>,
}

impl ClaimFlow {
    pub fn new(engine: IssuanceEngine, resolver: Resolver, local: Arc<LocalStore>) -> Self {
        Self {
            engine,
            resolver,
            local,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn engine(&self) -> &IssuanceEngine {
        &self.engine
    }

    pub fn local(&self) -> &Arc<LocalStore> {
        &self.local
    }

    /// Issues the offered credential and links it into the holder's DID document.
    ///
    /// Nothing is uploaded when the holder already holds an active credential of the same type,
    /// when a claim of that type by the same holder is still running, or when the holder
    /// document lacks the proof verification method.
    pub async fn accept(
        &self,
        offer: &CredentialOffer,
        challenge: &str,
        signature: &str,
        network: &NetworkConfig,
    ) -> Result<ClaimReceipt, ClaimError> {
        let holder = offer.holder();
        let type_key = offer
            .type_key()
            .ok_or_else(|| ClaimError::Validation("offer has no credential schema".to_owned()))?;
        if self.engine.catalog().get(type_key).is_none() {
            return Err(IssuerError::UnknownType(type_key.to_owned()).into());
        }
        let did = holder.to_string();
        let _reservation =
            Reservation::acquire(&self.in_flight, (did.clone(), type_key.to_owned())).ok_or_else(
                || ClaimError::InProgress {
                    type_key: type_key.to_owned(),
                    did: did.clone(),
                },
            )?;
        let existing = {
            let (type_key, did) = (type_key.to_owned(), did.clone());
            self.local
                .run_blocking(move |local| local.find_claimed(&type_key, &did, Utc::now()))
                .await
                .map_err(ClaimError::Cache)?
        };
        if let Some(existing) = existing {
            return Err(ClaimError::AlreadyClaimed {
                type_key: type_key.to_owned(),
                did,
                uri: existing.storage.uri,
            });
        }
        let mut offer = offer.clone();
        offer
            .accept()
            .map_err(|err| ClaimError::Validation(err.to_string()))?;

        let resolution = self.resolver.resolve_did(network, holder).await?;
        let key_id = holder.default_key_id();
        if !resolution.document.has_verification_method(&key_id) {
            return Err(ClaimError::MissingVerificationMethod(key_id));
        }

        let credential = self.engine.issue(&offer, challenge, signature).await?;
        let linked = link_credential(
            self.engine.store().as_ref(),
            &resolution.document,
            &credential.storage.uri,
        )
        .await
        .map_err(|source| {
            warn!(
                "Orphaned credential {}: DID document update failed: {source}",
                credential.storage.uri
            );
            ClaimError::Link {
                credential_uri: credential.storage.uri.clone(),
                source,
            }
        })?;

        let (cached, document, uri) = (
            credential.clone(),
            linked.document.clone(),
            linked.uri.clone(),
        );
        self.local
            .run_blocking(move |local| {
                local.save_credential(&cached)?;
                local.save_did_document(&document, &uri)
            })
            .await
            .map_err(|source| ClaimError::Persist {
                credential_uri: credential.storage.uri.clone(),
                document_uri: linked.uri.clone(),
                source,
            })?;
        info!(
            "{holder} claimed {type_key}: credential {}, document {}",
            credential.storage.uri, linked.uri
        );

        Ok(ClaimReceipt {
            tx_hash: credential.storage.anchor_tx_hash.clone(),
            credential,
            did_document_url: linked.uri,
            document: linked.document,
        })
    }
}

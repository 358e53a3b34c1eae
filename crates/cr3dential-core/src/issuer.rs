//! Credential issuance: accepted offer -> stored (and optionally anchored) credential.
use crate::anchor::{AnchorReceipt, LedgerAnchor};
use crate::catalog::CredentialCatalog;
use crate::credential::{
    CredentialSubject, Proof, StorageMetadata, StoredCredential, VerifiableCredential,
};
use crate::did::{Did, DidError};
use crate::directory::{DirectoryError, IssuerDirectory};
use crate::document::DidDocument;
use crate::ledger::LedgerError;
use crate::offer::{CredentialOffer, OfferStatus};
use crate::store::{upload_json, ContentStore, StoreError};
use crate::CREDENTIAL_CONTEXTS;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Proof type of issued credentials.
pub const PROOF_TYPE: &str = "EcdsaSecp256k1Signature2019";

/// Proof purpose of issued credentials.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// An error relating to credential issuance.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// Missing or inconsistent input. Nothing was persisted.
    #[error("Invalid issuance request: {0}")]
    Validation(String),
    /// Offer refers to a type key missing from the catalog. Nothing was persisted.
    #[error("Unknown credential type: {0}")]
    UnknownType(String),
    /// Issuer DID not listed in the issuer directory.
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(Did),
    /// Issuer directory could not be consulted. Retryable.
    #[error("Issuer directory error: {0}")]
    Directory(#[from] DirectoryError),
    /// Credential could not be uploaded. Nothing was persisted.
    #[error("Credential upload failed: {0}")]
    Upload(#[from] StoreError),
    /// Credential uploaded to `uri` but the anchoring transaction failed.
    #[error("Credential uploaded to {uri} but not anchored: {source}")]
    Anchor {
        uri: String,
        #[source]
        source: LedgerError,
    },
    #[error("Invalid DID: {0}")]
    InvalidDid(#[from] DidError),
}

impl IssuerError {
    /// URI of an uploaded but unanchored object, if any.
    pub fn orphaned_uri(&self) -> Option<&str> {
        match self {
            IssuerError::Anchor { uri, .. } => Some(uri),
            _ => None,
        }
    }
}

fn validation(message: impl Into<String>) -> IssuerError {
    IssuerError::Validation(message.into())
}

/// Issues credentials for accepted offers.
#[derive(Clone)]
pub struct IssuanceEngine {
    catalog: Arc<CredentialCatalog>,
    directory: Arc<dyn IssuerDirectory>,
    store: Arc<dyn ContentStore>,
    anchor: Option<LedgerAnchor>,
}

impl IssuanceEngine {
    pub fn new(
        catalog: Arc<CredentialCatalog>,
        directory: Arc<dyn IssuerDirectory>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            catalog,
            directory,
            store,
            anchor: None,
        }
    }

    /// Anchors each issued credential URI from the anchor's account.
    pub fn with_anchor(mut self, anchor: LedgerAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn catalog(&self) -> &CredentialCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn anchors_credentials(&self) -> bool {
        self.anchor.is_some()
    }

    pub async fn issue(
        &self,
        offer: &CredentialOffer,
        challenge: &str,
        signature: &str,
    ) -> Result<StoredCredential, IssuerError> {
        self.issue_at(offer, challenge, signature, Utc::now()).await
    }

    /// Validates, constructs, uploads and optionally anchors a credential issued at `now`.
    pub async fn issue_at(
        &self,
        offer: &CredentialOffer,
        challenge: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredCredential, IssuerError> {
        let credential = self.construct(offer, challenge, signature, now).await?;

        let stored = upload_json(
            self.store.as_ref(),
            &credential,
            &format!("credential-{}", credential.id),
        )
        .await?;
        info!("Uploaded credential {} to {}", credential.id, stored.uri);

        let anchor_tx_hash = match &self.anchor {
            Some(anchor) => match anchor.anchor_uri(&stored.uri).await {
                Ok(receipt) => Some(receipt.tx_hash),
                Err(source) => {
                    warn!(
                        "Orphaned credential {} at {}: anchoring failed: {source}",
                        credential.id, stored.uri
                    );
                    return Err(IssuerError::Anchor {
                        uri: stored.uri,
                        source,
                    });
                }
            },
            None => None,
        };

        Ok(StoredCredential::new(
            credential,
            StorageMetadata {
                content_id: stored.content_id,
                uri: stored.uri,
                anchor_tx_hash,
            },
        ))
    }

    /// Validates the request and builds the credential. Performs no writes.
    async fn construct(
        &self,
        offer: &CredentialOffer,
        challenge: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiableCredential, IssuerError> {
        if offer.id.trim().is_empty() {
            return Err(validation("offer id is required"));
        }
        if challenge.trim().is_empty() {
            return Err(validation("challenge is required"));
        }
        if signature.trim().is_empty() {
            return Err(validation("signature is required"));
        }
        let type_key = offer
            .type_key()
            .ok_or_else(|| validation("offer has no credential schema"))?;
        let template = self
            .catalog
            .get(type_key)
            .ok_or_else(|| IssuerError::UnknownType(type_key.to_owned()))?;
        if offer.issuer != template.issuer_did {
            return Err(validation(format!(
                "offer issuer {} does not issue {type_key}",
                offer.issuer
            )));
        }
        if offer.kind != template.kind {
            return Err(validation(format!("offer type does not match {type_key}")));
        }
        if offer.status == OfferStatus::Declined {
            return Err(validation(format!("offer {} was declined", offer.id)));
        }
        if offer.is_expired_at(now) {
            return Err(validation(format!("offer {} has expired", offer.id)));
        }
        let offered: BTreeSet<&String> = offer.credential_subject.fields.keys().collect();
        let expected: BTreeSet<&String> = template.fields.keys().collect();
        if offered != expected {
            return Err(validation(format!(
                "credential subject fields do not match {type_key}"
            )));
        }

        let issuer = self
            .directory
            .find_issuer(&template.issuer_did)
            .await?
            .and_then(|metadata| metadata.did)
            .ok_or_else(|| IssuerError::UnknownIssuer(template.issuer_did.clone()))?;
        debug!("Issuing {type_key} from {issuer} to {}", offer.holder());

        let holder = offer.holder();
        Ok(VerifiableCredential {
            context: CREDENTIAL_CONTEXTS.map(String::from).to_vec(),
            id: offer.id.clone(),
            type_: template.kind.credential_types(),
            issuer: issuer.to_string(),
            issuance_date: now,
            expiration_date: offer.valid_until,
            credential_schema: offer.credential_schema.clone(),
            credential_subject: CredentialSubject {
                id: holder.to_string(),
                fields: template.fields.clone(),
            },
            image: template.image.clone(),
            proof: Proof {
                type_: PROOF_TYPE.to_owned(),
                created: now,
                verification_method: holder.default_key_id(),
                proof_purpose: PROOF_PURPOSE.to_owned(),
                challenge: Some(challenge.to_owned()),
                proof_value: signature.to_owned(),
            },
        })
    }
}

/// Public profile published alongside an issuer DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerProfile {
    #[serde(rename = "type")]
    pub type_: String,
    pub name: String,
    pub sector: String,
    pub website: String,
}

/// Result of publishing and anchoring an issuer DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerDidClaim {
    pub did: Did,
    pub profile_uri: String,
    pub document_uri: String,
    pub document: DidDocument,
    pub receipt: AnchorReceipt,
}

/// Uploads `profile`, publishes an issuer DID document for the anchor's account and anchors it.
pub async fn claim_issuer_did(
    store: &dyn ContentStore,
    anchor: &LedgerAnchor,
    profile: &IssuerProfile,
) -> Result<IssuerDidClaim, IssuerError> {
    let did = Did::for_account(anchor.account())?;
    let profile_object = upload_json(store, profile, &format!("profile-{did}")).await?;
    let document = DidDocument::for_issuer(&did, anchor.public_key_hex(), &profile_object.uri);
    let document_object = upload_json(
        store,
        &document,
        &format!("did-document-{did}-{}", Utc::now().timestamp_millis()),
    )
    .await?;
    let receipt = anchor
        .anchor_uri(&document_object.uri)
        .await
        .map_err(|source| {
            warn!(
                "Orphaned issuer document at {}: anchoring failed: {source}",
                document_object.uri
            );
            IssuerError::Anchor {
                uri: document_object.uri.clone(),
                source,
            }
        })?;
    info!("Claimed issuer DID {did} in {}", receipt.tx_hash);
    Ok(IssuerDidClaim {
        did,
        profile_uri: profile_object.uri,
        document_uri: document_object.uri,
        document,
        receipt,
    })
}

//! Verifiable credential data model.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// First entry of every credential `type` sequence.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Schema kind recorded in `credentialSchema` entries.
pub const CREDENTIAL_SCHEMA_TYPE: &str = "JsonSchema";

/// An error relating to the credential lifecycle.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    /// Status change not allowed from the current status.
    #[error("Credential status cannot change from '{0}' to '{1}'.")]
    InvalidTransition(CredentialStatus, CredentialStatus),
}

/// Category of a credential, mapped to its canonical W3C type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Training,
    Identity,
}

impl CredentialKind {
    /// Display name of the kind, e.g. `Training`.
    pub fn name(&self) -> &'static str {
        match self {
            CredentialKind::Training => "Training",
            CredentialKind::Identity => "Identity",
        }
    }

    /// Canonical credential type, e.g. `TrainingCredential`.
    pub fn type_name(&self) -> &'static str {
        match self {
            CredentialKind::Training => "TrainingCredential",
            CredentialKind::Identity => "IdentityCredential",
        }
    }

    /// Full `type` sequence of a credential of this kind.
    pub fn credential_types(&self) -> Vec<String> {
        vec![
            VERIFIABLE_CREDENTIAL_TYPE.to_string(),
            self.type_name().to_string(),
        ]
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scalar value of a credential field.
// Variant order matters for untagged deserialization: ISO dates must win over plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Date(date) => write!(f, "{date}"),
            FieldValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

/// Credential fields keyed by name.
pub type Fields = BTreeMap<String, FieldValue>;

/// Reference from an offer or credential back to its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    /// Catalog type key.
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
}

impl CredentialSchema {
    pub fn new(type_key: &str) -> Self {
        Self {
            id: type_key.to_string(),
            type_: CREDENTIAL_SCHEMA_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSubject {
    /// Holder DID.
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: String,
    pub created: DateTime<Utc>,
    pub verification_method: String,
    pub proof_purpose: String,
    /// Challenge the holder signed to accept the offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    pub proof_value: String,
}

/// A credential following the W3C verifiable credentials data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub type_: Vec<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credential_schema: Vec<CredentialSchema>,
    pub credential_subject: CredentialSubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub proof: Proof,
}

impl VerifiableCredential {
    /// Catalog type key this credential was issued from.
    pub fn type_key(&self) -> Option<&str> {
        self.credential_schema
            .first()
            .map(|schema| schema.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
    Expired,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            CredentialStatus::Active => "active",
            CredentialStatus::Revoked => "revoked",
            CredentialStatus::Expired => "expired",
        };
        write!(f, "{status}")
    }
}

/// Where an issued credential lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageMetadata {
    pub content_id: String,
    /// Retrieval URI of the credential JSON.
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_tx_hash: Option<String>,
}

/// An issued credential with its lifecycle status and storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(flatten)]
    pub credential: VerifiableCredential,
    pub status: CredentialStatus,
    pub storage: StorageMetadata,
}

impl StoredCredential {
    pub fn new(credential: VerifiableCredential, storage: StorageMetadata) -> Self {
        Self {
            credential,
            status: CredentialStatus::Active,
            storage,
        }
    }

    /// Status as displayed at `now`: an active credential past its expiration date is expired.
    pub fn status_at(&self, now: DateTime<Utc>) -> CredentialStatus {
        match (self.status, self.credential.expiration_date) {
            (CredentialStatus::Active, Some(expiration)) if expiration <= now => {
                CredentialStatus::Expired
            }
            (status, _) => status,
        }
    }

    /// Marks an active credential as revoked.
    pub fn revoke(&mut self) -> Result<(), CredentialError> {
        match self.status {
            CredentialStatus::Active => {
                self.status = CredentialStatus::Revoked;
                Ok(())
            }
            status => Err(CredentialError::InvalidTransition(
                status,
                CredentialStatus::Revoked,
            )),
        }
    }
}

//! Credential offers built from catalog templates.
use crate::catalog::{CredentialCatalog, CredentialTemplate};
use crate::credential::{CredentialKind, CredentialSchema, Fields};
use crate::did::Did;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An error relating to credential offers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OfferError {
    /// Type key not present in the catalog.
    #[error("Unknown credential type: {0}")]
    UnknownType(String),
    /// Offer cannot move to the requested status.
    #[error("Offer {0} has already been {1}.")]
    AlreadyResolved(String, OfferStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfferStatus {
    #[default]
    PendingApproval,
    Accepted,
    Declined,
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            OfferStatus::PendingApproval => "pending-approval",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
        };
        write!(f, "{status}")
    }
}

/// Offer subject: the holder DID plus the template fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubject {
    pub did: Did,
    #[serde(flatten)]
    pub fields: Fields,
}

/// An unsigned, time-bounded proposal to issue a credential to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialOffer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
    pub issuer: Did,
    pub credential_schema: Vec<CredentialSchema>,
    pub credential_subject: OfferSubject,
    pub valid_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: OfferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CredentialOffer {
    /// Catalog type key the offer was built from.
    pub fn type_key(&self) -> Option<&str> {
        self.credential_schema
            .first()
            .map(|schema| schema.id.as_str())
    }

    pub fn holder(&self) -> &Did {
        &self.credential_subject.did
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(false, |valid_until| valid_until <= now)
    }

    pub fn accept(&mut self) -> Result<(), OfferError> {
        self.resolve(OfferStatus::Accepted)
    }

    pub fn decline(&mut self) -> Result<(), OfferError> {
        self.resolve(OfferStatus::Declined)
    }

    fn resolve(&mut self, status: OfferStatus) -> Result<(), OfferError> {
        match self.status {
            OfferStatus::PendingApproval => {
                self.status = status;
                Ok(())
            }
            current if current == status => Ok(()),
            current => Err(OfferError::AlreadyResolved(self.id.clone(), current)),
        }
    }
}

/// Public view of a catalog entry, shown before a holder requests an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPreview {
    #[serde(rename = "type")]
    pub type_key: String,
    pub kind: CredentialKind,
    pub issuer: Did,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Builds credential offers from catalog templates.
pub struct OfferBuilder<'a> {
    catalog: &'a CredentialCatalog,
}

impl<'a> OfferBuilder<'a> {
    pub fn new(catalog: &'a CredentialCatalog) -> Self {
        Self { catalog }
    }

    fn template(&self, type_key: &str) -> Result<&'a CredentialTemplate, OfferError> {
        self.catalog
            .get(type_key)
            .ok_or_else(|| OfferError::UnknownType(type_key.to_owned()))
    }

    /// Builds a pending offer of `type_key` for `holder`.
    pub fn build_offer(&self, type_key: &str, holder: &Did) -> Result<CredentialOffer, OfferError> {
        self.build_offer_at(type_key, holder, Utc::now())
    }

    pub fn build_offer_at(
        &self,
        type_key: &str,
        holder: &Did,
        now: DateTime<Utc>,
    ) -> Result<CredentialOffer, OfferError> {
        let template = self.template(type_key)?;
        Ok(CredentialOffer {
            id: Uuid::new_v4().to_string(),
            kind: template.kind,
            issuer: template.issuer_did.clone(),
            credential_schema: vec![CredentialSchema::new(type_key)],
            credential_subject: OfferSubject {
                did: holder.clone(),
                fields: template.fields.clone(),
            },
            valid_from: now,
            valid_until: template
                .expires_in_days
                .map(|days| now + Duration::days(days.into())),
            status: OfferStatus::PendingApproval,
            image: template.image.clone(),
        })
    }

    pub fn preview(&self, type_key: &str) -> Result<OfferPreview, OfferError> {
        let template = self.template(type_key)?;
        Ok(OfferPreview {
            type_key: type_key.to_owned(),
            kind: template.kind,
            issuer: template.issuer_did.clone(),
            fields: template.fields.clone(),
            expires_in_days: template.expires_in_days,
            image: template.image.clone(),
        })
    }
}

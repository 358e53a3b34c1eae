//! Static catalog of credential offer templates.
use crate::credential::{CredentialKind, Fields};
use crate::did::Did;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Subject field holding the holder DID, never declared by a template.
pub const RESERVED_SUBJECT_FIELD: &str = "did";

/// An error relating to loading the credential catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Template declares a field that collides with the holder DID.
    #[error("Credential type '{0}' declares reserved field '{RESERVED_SUBJECT_FIELD}'.")]
    ReservedField(String),
    /// Catalog file could not be read.
    #[error("Failed to read credential catalog: {0}")]
    Read(#[from] std::io::Error),
    /// Catalog JSON could not be deserialized.
    #[error("Failed to deserialize credential catalog: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Immutable description of a credential type offered by an issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTemplate {
    pub issuer_did: Did,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Read-only lookup of credential templates by type key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialCatalog {
    templates: BTreeMap<String, CredentialTemplate>,
}

impl CredentialCatalog {
    pub fn new(templates: BTreeMap<String, CredentialTemplate>) -> Result<Self, CatalogError> {
        if let Some((type_key, _)) = templates
            .iter()
            .find(|(_, template)| template.fields.contains_key(RESERVED_SUBJECT_FIELD))
        {
            return Err(CatalogError::ReservedField(type_key.to_owned()));
        }
        Ok(Self { templates })
    }

    /// Parses a JSON object mapping type keys to templates.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Catalog shipped with the issuer.
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }

    pub fn get(&self, type_key: &str) -> Option<&CredentialTemplate> {
        self.templates.get(type_key)
    }

    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CredentialTemplate)> {
        self.templates
            .iter()
            .map(|(type_key, template)| (type_key.as_str(), template))
    }
}

const BUILTIN_CATALOG_JSON: &str = r#"{
    "42-software-engineering": {
        "issuerDid": "did:xrpl:1:rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe",
        "type": "training",
        "fields": {
            "name": "Software Engineering",
            "provider": "42",
            "location": "Paris, France"
        },
        "expiresInDays": 365,
        "image": "/images/42.webp"
    },
    "easya-training": {
        "issuerDid": "did:xrpl:1:rEABey99Sy7nohSEp9hWxjHMjUDSsBxeXi",
        "type": "training",
        "fields": {
            "name": "Blockchain Basis",
            "provider": "EasyA",
            "location": "Paris, France"
        },
        "expiresInDays": 365,
        "image": "/images/easya.jpg"
    },
    "xrpl-training": {
        "issuerDid": "did:xrpl:1:r4JWSRAf1wSojHg7JEf6H9JT4eJ6tajHui",
        "type": "training",
        "fields": {
            "name": "Dev Training",
            "provider": "XRP Ledger",
            "location": "Paris, France"
        },
        "expiresInDays": 365,
        "image": "/images/xrpl-commons.webp"
    },
    "identity-m": {
        "issuerDid": "did:xrpl:1:rHUy4Vuc4J1sgkijpFt8QvWH9kjhksVP7y",
        "type": "identity",
        "fields": {
            "title": "Monsieur",
            "firstName": "Jean-Pierre",
            "lastName": "Dubois",
            "dateOfBirth": "1988-09-23",
            "country": "France",
            "phoneNumber": "+33612345678",
            "email": "jp.dubois@orange.fr",
            "address": "15 Rue du Vieux Vignoble",
            "city": "Bordeaux",
            "state": "Nouvelle-Aquitaine",
            "zipCode": "33000",
            "socialSecurityNumber": "1 88 09 33 222 123 45",
            "driverLicenseNumber": "88BX54321",
            "passportNumber": "19AF78901",
            "issuingCountry": "France"
        }
    },
    "identity-f": {
        "issuerDid": "did:xrpl:1:rHUy4Vuc4J1sgkijpFt8QvWH9kjhksVP7y",
        "type": "identity",
        "fields": {
            "title": "Madame",
            "firstName": "Marie",
            "lastName": "Laurent",
            "dateOfBirth": "1992-05-15",
            "country": "France",
            "phoneNumber": "+33623456789",
            "email": "m.laurent@orange.fr",
            "address": "27 Avenue des Champs-Élysées",
            "city": "Paris",
            "state": "Île-de-France",
            "zipCode": "75008",
            "socialSecurityNumber": "2 92 05 75 333 234 56",
            "driverLicenseNumber": "92PR98765",
            "passportNumber": "20BG45678",
            "issuingCountry": "France"
        }
    }
}"#;

lazy_static! {
    static ref BUILTIN_CATALOG: CredentialCatalog =
        CredentialCatalog::from_json(BUILTIN_CATALOG_JSON).expect("Invalid built-in catalog.");
}

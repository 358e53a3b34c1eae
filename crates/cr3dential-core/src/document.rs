//! DID document data model.
use crate::did::Did;
use crate::{DID_CONTEXT, VERIFICATION_KEY_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public key value of the synthesized default document.
const DEFAULT_PUBLIC_KEY: &str = "default";

/// Fragment of the issuer profile service.
pub const PROFILE_SERVICE_FRAGMENT: &str = "profile";

/// Service type of the issuer profile service.
pub const PROFILE_SERVICE_TYPE: &str = "Public Profile";

/// JSON-LD context, either a single URI or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Context {
    One(String),
    Many(Vec<String>),
}

impl Default for Context {
    fn default() -> Self {
        Context::Many(vec![DID_CONTEXT.to_string()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub service_endpoint: String,
}

/// Credentials linked to a DID, stored under the document's `credentialSubject`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkedCredentials {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub did: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<String>,
}

/// A DID document describing the keys, services and linked credentials of a DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default)]
    pub context: Context,
    pub id: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<LinkedCredentials>,
    /// Members not modelled above, preserved as fetched.
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl DidDocument {
    /// Minimal document for a DID with no anchored document. Never persisted by the resolver.
    pub fn synthesize_default(did: &Did) -> Self {
        let key_id = did.default_key_id();
        Self {
            context: Context::default(),
            id: did.to_string(),
            controller: did.to_string(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                type_: VERIFICATION_KEY_TYPE.to_string(),
                controller: did.to_string(),
                public_key_multibase: Some(DEFAULT_PUBLIC_KEY.to_string()),
                public_key_hex: None,
            }],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
            service: Vec::new(),
            credential_subject: Some(LinkedCredentials {
                did: did.to_string(),
                credentials: Vec::new(),
            }),
            property_set: Map::new(),
        }
    }

    /// Issuer document with a single assertion key and a public profile service.
    pub fn for_issuer(did: &Did, public_key_hex: &str, profile_uri: &str) -> Self {
        let key_id = did.default_key_id();
        Self {
            context: Context::One(DID_CONTEXT.to_string()),
            id: did.to_string(),
            controller: did.to_string(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                type_: VERIFICATION_KEY_TYPE.to_string(),
                controller: did.to_string(),
                public_key_multibase: None,
                public_key_hex: Some(public_key_hex.to_string()),
            }],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
            service: vec![Service {
                id: did.key_id(PROFILE_SERVICE_FRAGMENT),
                type_: PROFILE_SERVICE_TYPE.to_string(),
                service_endpoint: profile_uri.to_string(),
            }],
            credential_subject: None,
            property_set: Map::new(),
        }
    }

    /// Credential pointers linked to this DID, most recent first.
    pub fn linked_credentials(&self) -> &[String] {
        self.credential_subject
            .as_ref()
            .map(|subject| subject.credentials.as_slice())
            .unwrap_or_default()
    }

    /// Whether a verification method with the given id is declared.
    pub fn has_verification_method(&self, id: &str) -> bool {
        self.verification_method.iter().any(|method| method.id == id)
    }
}

//! Linking credential pointers into DID documents.
use crate::document::{DidDocument, LinkedCredentials};
use crate::store::{upload_json, ContentStore, StoreError};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

/// An updated DID document and where it was uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedDocument {
    pub document: DidDocument,
    pub uri: String,
    pub content_id: String,
}

/// Prepends `pointer` to the document's linked credentials, keeping each pointer once.
pub fn link(document: &mut DidDocument, pointer: &str) {
    let subject = document
        .credential_subject
        .get_or_insert_with(|| LinkedCredentials {
            did: document.id.clone(),
            credentials: Vec::new(),
        });
    if subject.did.is_empty() {
        subject.did = document.id.clone();
    }
    subject.credentials.retain(|existing| existing != pointer);
    subject.credentials.insert(0, pointer.to_owned());
}

/// Links `pointer` into a copy of `document` and uploads the result.
///
/// Uploads are not retried here: a failed upload leaves the caller's document untouched.
pub async fn link_credential(
    store: &dyn ContentStore,
    document: &DidDocument,
    pointer: &str,
) -> Result<LinkedDocument, StoreError> {
    let mut updated = document.clone();
    link(&mut updated, pointer);
    let name = format!(
        "did-document-{}-{}",
        document.id,
        Utc::now().timestamp_millis()
    );
    let stored = upload_json(store, &updated, &name).await?;
    info!("Linked {pointer} into {} at {}", document.id, stored.uri);
    Ok(LinkedDocument {
        document: updated,
        uri: stored.uri,
        content_id: stored.content_id,
    })
}

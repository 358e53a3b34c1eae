//! Local cache of issued credentials and DID documents.
//!
//! The cache is not authoritative: it avoids re-issuing claimed credentials and supports
//! offline display. The content store and ledger remain the source of truth.
use crate::credential::{CredentialStatus, StoredCredential};
use crate::document::DidDocument;
use crate::CR3DENTIAL_DATA;
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;
use thiserror::Error;

const CREDENTIALS_FILE: &str = "credentials.json";
const DID_DOCUMENTS_FILE: &str = "did_documents.json";

/// An error relating to the local cache.
#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("{CR3DENTIAL_DATA} environment variable is not set.")]
    MissingDataDir,
    #[error("Local cache IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Local cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to persist local cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("Local cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Cached DID document with the URI it was uploaded to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDidDocument {
    pub document: DidDocument,
    pub uri: String,
    pub updated_at: DateTime<Utc>,
}

/// JSON file cache rooted at a data directory.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Cache rooted at `$CR3DENTIAL_DATA`.
    pub fn from_env() -> Result<Self, LocalStoreError> {
        let root = std::env::var(CR3DENTIAL_DATA).map_err(|_| LocalStoreError::MissingDataDir)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs cache operations on the blocking thread pool.
    pub async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T, LocalStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&LocalStore) -> Result<T, LocalStoreError> + Send + 'static,
    {
        let local = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&local)).await?
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, LocalStoreError> {
        match std::fs::read(self.root.join(file)) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces `file` atomically.
    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), LocalStoreError> {
        std::fs::create_dir_all(&self.root)?;
        let mut temp = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(&mut temp, value)?;
        temp.flush()?;
        temp.persist(self.root.join(file))?;
        Ok(())
    }

    pub fn credentials(&self) -> Result<Vec<StoredCredential>, LocalStoreError> {
        let _guard = self.guard();
        self.read(CREDENTIALS_FILE)
    }

    /// Cached credentials whose subject is `did`.
    pub fn credentials_for(&self, did: &str) -> Result<Vec<StoredCredential>, LocalStoreError> {
        Ok(self
            .credentials()?
            .into_iter()
            .filter(|stored| stored.credential.credential_subject.id == did)
            .collect())
    }

    /// An active credential of `type_key` already issued to `did`, as of `now`.
    pub fn find_claimed(
        &self,
        type_key: &str,
        did: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredCredential>, LocalStoreError> {
        Ok(self.credentials_for(did)?.into_iter().find(|stored| {
            stored.credential.type_key() == Some(type_key)
                && stored.status_at(now) == CredentialStatus::Active
        }))
    }

    /// Adds a credential, replacing a cached copy with the same content id.
    pub fn save_credential(&self, credential: &StoredCredential) -> Result<(), LocalStoreError> {
        let _guard = self.guard();
        let mut credentials: Vec<StoredCredential> = self.read(CREDENTIALS_FILE)?;
        credentials.retain(|stored| stored.storage.content_id != credential.storage.content_id);
        credentials.push(credential.clone());
        self.write(CREDENTIALS_FILE, &credentials)?;
        debug!("Cached credential {}", credential.storage.uri);
        Ok(())
    }

    pub fn did_documents(&self) -> Result<BTreeMap<String, StoredDidDocument>, LocalStoreError> {
        let _guard = self.guard();
        self.read(DID_DOCUMENTS_FILE)
    }

    pub fn did_document(&self, did: &str) -> Result<Option<StoredDidDocument>, LocalStoreError> {
        Ok(self.did_documents()?.remove(did))
    }

    pub fn save_did_document(
        &self,
        document: &DidDocument,
        uri: &str,
    ) -> Result<(), LocalStoreError> {
        let _guard = self.guard();
        let mut documents: BTreeMap<String, StoredDidDocument> = self.read(DID_DOCUMENTS_FILE)?;
        documents.insert(
            document.id.clone(),
            StoredDidDocument {
                document: document.clone(),
                uri: uri.to_owned(),
                updated_at: Utc::now(),
            },
        );
        self.write(DID_DOCUMENTS_FILE, &documents)?;
        debug!("Cached DID document {} at {uri}", document.id);
        Ok(())
    }
}

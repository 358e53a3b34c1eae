//! Handlers and trait for resolving and updating DID documents.
use crate::errors::Cr3dentialHTTPError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cr3dential_core::document::DidDocument;
use cr3dential_core::ledger::{Network, NetworkConfig};
use cr3dential_core::local::LocalStore;
use cr3dential_core::resolver::Resolver;
use cr3dential_core::store::ContentStore;
use cr3dential_core::updater::link_credential;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkQuery {
    pub network: Option<String>,
}

/// A resolved DID document and the URI it was fetched from, absent for synthesized documents.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DidDocumentResponse {
    pub document: DidDocument,
    pub uri: Option<String>,
}

/// Body of a DID document update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocumentUpdate {
    pub did_document: Option<DidDocument>,
    /// Retrieval URI of the credential to link.
    pub credential_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocumentUpdateResponse {
    pub did_document_url: String,
    pub document: DidDocument,
}

/// An API for resolving DID documents and linking credentials into them.
#[async_trait]
pub trait Cr3dentialDidDocumentsHTTP {
    /// Resolves a DID document.
    async fn resolve_did(
        did: &str,
        resolver: &Resolver,
        network: &NetworkConfig,
    ) -> Result<DidDocumentResponse, Cr3dentialHTTPError>;

    /// Links a credential into a DID document and uploads the result.
    async fn update_did_document(
        store: &dyn ContentStore,
        local: &Arc<LocalStore>,
        update: DidDocumentUpdate,
    ) -> Result<DidDocumentUpdateResponse, Cr3dentialHTTPError>;
}

/// Type for implementing handlers for resolving and updating DID documents.
pub struct Cr3dentialDidDocumentsHTTPHandler;

#[async_trait]
impl Cr3dentialDidDocumentsHTTP for Cr3dentialDidDocumentsHTTPHandler {
    async fn resolve_did(
        did: &str,
        resolver: &Resolver,
        network: &NetworkConfig,
    ) -> Result<DidDocumentResponse, Cr3dentialHTTPError> {
        debug!("Resolving {did} on {}", network.network);
        let resolution = resolver.resolve(network, did).await?;
        Ok(DidDocumentResponse {
            document: resolution.document,
            uri: resolution.uri,
        })
    }

    async fn update_did_document(
        store: &dyn ContentStore,
        local: &Arc<LocalStore>,
        update: DidDocumentUpdate,
    ) -> Result<DidDocumentUpdateResponse, Cr3dentialHTTPError> {
        let document = update
            .did_document
            .ok_or(Cr3dentialHTTPError::MissingField("didDocument"))?;
        let pointer = update
            .credential_hash
            .filter(|pointer| !pointer.trim().is_empty())
            .ok_or(Cr3dentialHTTPError::MissingField("credentialHash"))?;
        let linked = link_credential(store, &document, &pointer).await?;
        let (document, uri) = (linked.document.clone(), linked.uri.clone());
        if let Err(err) = local
            .run_blocking(move |local| local.save_did_document(&document, &uri))
            .await
        {
            warn!("Failed to cache DID document {}: {err}", linked.uri);
        }
        Ok(DidDocumentUpdateResponse {
            did_document_url: linked.uri,
            document: linked.document,
        })
    }
}

impl Cr3dentialDidDocumentsHTTPHandler {
    /// Handles get request for DID resolution.
    pub async fn get_did_document(
        Path(did): Path<String>,
        State(app_state): State<Arc<AppState>>,
        query: Result<Query<NetworkQuery>, QueryRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Query(query) = query?;
        let network = query
            .network
            .as_deref()
            .map(str::parse::<Network>)
            .transpose()?;
        let network = app_state.network_config(network);
        let response = Self::resolve_did(&did, &app_state.resolver, &network).await?;
        Ok((StatusCode::OK, Json(response)))
    }

    /// Handles post request linking a credential into a DID document.
    pub async fn post_did_document(
        State(app_state): State<Arc<AppState>>,
        update: Result<Json<DidDocumentUpdate>, JsonRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Json(update) = update?;
        let response =
            Self::update_did_document(app_state.store().as_ref(), app_state.local(), update)
                .await?;
        Ok((StatusCode::OK, Json(response)))
    }
}

//! Handlers and trait for credential requests, offers and claims.
use crate::errors::Cr3dentialHTTPError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cr3dential_core::catalog::CredentialCatalog;
use cr3dential_core::claim::{ClaimFlow, ClaimReceipt};
use cr3dential_core::credential::StoredCredential;
use cr3dential_core::did::Did;
use cr3dential_core::directory::{IssuerDirectory, IssuerMetadata};
use cr3dential_core::ledger::NetworkConfig;
use cr3dential_core::local::LocalStore;
use cr3dential_core::offer::{CredentialOffer, OfferBuilder, OfferPreview};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of a credential offer request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialRequest {
    pub did: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub type_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OfferQuery {
    #[serde(rename = "type")]
    pub type_key: Option<String>,
}

/// Catalog entry shown to a holder together with its issuer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub credential_offer: OfferPreview,
    pub issuer: Option<IssuerMetadata>,
}

/// Body of an offer acceptance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAcceptance {
    pub credential_offer: Option<CredentialOffer>,
    pub challenge: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsQuery {
    pub did: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsResponse {
    pub credentials: Vec<StoredCredential>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Cr3dentialHTTPError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(Cr3dentialHTTPError::MissingField(field))
}

/// An API for requesting, previewing and claiming credentials.
#[async_trait]
pub trait Cr3dentialCredentialsHTTP {
    /// Builds an offer of the requested type for the requesting holder.
    fn request_offer(
        catalog: &CredentialCatalog,
        request: CredentialRequest,
    ) -> Result<CredentialOffer, Cr3dentialHTTPError>;

    /// Previews a catalog entry with its issuer metadata.
    async fn offer_preview(
        catalog: &CredentialCatalog,
        directory: &dyn IssuerDirectory,
        type_key: &str,
    ) -> Result<OfferResponse, Cr3dentialHTTPError>;

    /// Issues the offered credential and links it into the holder's DID document.
    async fn accept_offer(
        claims: &ClaimFlow,
        acceptance: OfferAcceptance,
        network: &NetworkConfig,
    ) -> Result<ClaimReceipt, Cr3dentialHTTPError>;

    /// Cached credentials of a holder with their current status.
    async fn list_credentials(
        local: &Arc<LocalStore>,
        did: &str,
    ) -> Result<CredentialsResponse, Cr3dentialHTTPError>;
}

/// Type for implementing the Cr3dentialCredentialsHTTP trait that will contain additional handler methods.
pub struct Cr3dentialCredentialsHTTPHandler;

#[async_trait]
impl Cr3dentialCredentialsHTTP for Cr3dentialCredentialsHTTPHandler {
    fn request_offer(
        catalog: &CredentialCatalog,
        request: CredentialRequest,
    ) -> Result<CredentialOffer, Cr3dentialHTTPError> {
        let did: Did = required(request.did, "did")?.parse()?;
        let email = required(request.email, "email")?;
        let type_key = required(request.type_key, "type")?;
        let offer = OfferBuilder::new(catalog).build_offer(&type_key, &did)?;
        info!("Offer {} of {type_key} for {did} ({email})", offer.id);
        Ok(offer)
    }

    async fn offer_preview(
        catalog: &CredentialCatalog,
        directory: &dyn IssuerDirectory,
        type_key: &str,
    ) -> Result<OfferResponse, Cr3dentialHTTPError> {
        let credential_offer = OfferBuilder::new(catalog).preview(type_key)?;
        let issuer = directory.find_issuer(&credential_offer.issuer).await?;
        Ok(OfferResponse {
            credential_offer,
            issuer,
        })
    }

    async fn accept_offer(
        claims: &ClaimFlow,
        acceptance: OfferAcceptance,
        network: &NetworkConfig,
    ) -> Result<ClaimReceipt, Cr3dentialHTTPError> {
        let offer = acceptance
            .credential_offer
            .ok_or(Cr3dentialHTTPError::MissingField("credentialOffer"))?;
        let challenge = required(acceptance.challenge, "challenge")?;
        let signature = required(acceptance.signature, "signature")?;
        Ok(claims
            .accept(&offer, &challenge, &signature, network)
            .await?)
    }

    async fn list_credentials(
        local: &Arc<LocalStore>,
        did: &str,
    ) -> Result<CredentialsResponse, Cr3dentialHTTPError> {
        let did = did.parse::<Did>()?.to_string();
        let now = Utc::now();
        let credentials = local
            .run_blocking(move |local| local.credentials_for(&did))
            .await?
            .into_iter()
            .map(|mut stored| {
                stored.status = stored.status_at(now);
                stored
            })
            .collect();
        Ok(CredentialsResponse { credentials })
    }
}

impl Cr3dentialCredentialsHTTPHandler {
    /// Handles post request for a credential offer.
    pub async fn post_request(
        State(app_state): State<Arc<AppState>>,
        request: Result<Json<CredentialRequest>, JsonRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Json(request) = request?;
        let offer = Self::request_offer(app_state.catalog(), request)?;
        Ok((StatusCode::OK, Json(offer)))
    }

    /// Handles get request for a catalog entry preview.
    pub async fn get_offer(
        State(app_state): State<Arc<AppState>>,
        query: Result<Query<OfferQuery>, QueryRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Query(query) = query?;
        let type_key = required(query.type_key, "type")?;
        let response =
            Self::offer_preview(app_state.catalog(), app_state.directory.as_ref(), &type_key)
                .await?;
        Ok((StatusCode::OK, Json(response)))
    }

    /// Handles post request accepting an offer. Responds 202 with the issued credential and the
    /// updated DID document URI, which the holder anchors.
    pub async fn post_offer(
        State(app_state): State<Arc<AppState>>,
        acceptance: Result<Json<OfferAcceptance>, JsonRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Json(acceptance) = acceptance?;
        debug!("Received offer acceptance: {:?}", acceptance.credential_offer);
        let network = app_state.network_config(None);
        let receipt = Self::accept_offer(&app_state.claims, acceptance, &network).await?;
        Ok((StatusCode::ACCEPTED, Json(receipt)))
    }

    /// Handles get request listing a holder's credentials.
    pub async fn get_credentials(
        State(app_state): State<Arc<AppState>>,
        query: Result<Query<CredentialsQuery>, QueryRejection>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let Query(query) = query?;
        let did = required(query.did, "did")?;
        let response = Self::list_credentials(app_state.local(), &did).await?;
        Ok((StatusCode::OK, Json(response)))
    }
}

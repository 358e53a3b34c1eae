use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::IntoResponse;
use axum::Json;
use cr3dential_core::catalog::CatalogError;
use cr3dential_core::claim::ClaimError;
use cr3dential_core::did::DidError;
use cr3dential_core::directory::DirectoryError;
use cr3dential_core::issuer::IssuerError;
use cr3dential_core::ledger::LedgerError;
use cr3dential_core::local::LocalStoreError;
use cr3dential_core::offer::OfferError;
use cr3dential_core::resolver::ResolverError;
use cr3dential_core::store::StoreError;
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Cr3dential HTTP error type.
#[derive(Error, Debug)]
pub enum Cr3dentialHTTPError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Invalid DID: {0}")]
    InvalidDid(#[from] DidError),
    #[error("{0}")]
    Offer(#[from] OfferError),
    #[error("{0}")]
    Resolver(#[from] ResolverError),
    #[error("{0}")]
    Issuer(#[from] IssuerError),
    #[error("{0}")]
    Claim(#[from] ClaimError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("DID document upload failed: {0}")]
    Store(#[from] StoreError),
    #[error("Local cache error: {0}")]
    Cache(#[from] LocalStoreError),
    #[error("Issuer directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("Credential catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Server error: {0}")]
    Server(#[from] hyper::Error),
    #[error("Not found.")]
    NotFound,
}

impl From<JsonRejection> for Cr3dentialHTTPError {
    fn from(rejection: JsonRejection) -> Self {
        Cr3dentialHTTPError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for Cr3dentialHTTPError {
    fn from(rejection: QueryRejection) -> Self {
        Cr3dentialHTTPError::InvalidQuery(rejection.body_text())
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::UnknownNetwork(_) => StatusCode::BAD_REQUEST,
        LedgerError::Rejected { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn resolver_status(err: &ResolverError) -> StatusCode {
    match err {
        ResolverError::InvalidDid(_) => StatusCode::BAD_REQUEST,
        ResolverError::Ledger(err) => ledger_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn issuer_status(err: &IssuerError) -> StatusCode {
    match err {
        IssuerError::Validation(_)
        | IssuerError::UnknownType(_)
        | IssuerError::UnknownIssuer(_)
        | IssuerError::InvalidDid(_) => StatusCode::BAD_REQUEST,
        IssuerError::Anchor { source, .. } => ledger_status(source),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn claim_status(err: &ClaimError) -> StatusCode {
    match err {
        ClaimError::Validation(_) | ClaimError::MissingVerificationMethod(_) => {
            StatusCode::BAD_REQUEST
        }
        ClaimError::AlreadyClaimed { .. } | ClaimError::InProgress { .. } => StatusCode::CONFLICT,
        ClaimError::Resolution(err) => resolver_status(err),
        ClaimError::Issuance(err) => issuer_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl Cr3dentialHTTPError {
    /// URI of a credential uploaded by a failed request and left unlinked.
    pub fn orphaned_uri(&self) -> Option<&str> {
        match self {
            Cr3dentialHTTPError::Issuer(err) => err.orphaned_uri(),
            Cr3dentialHTTPError::Claim(err) => err.orphaned_uri(),
            _ => None,
        }
    }
}

// Make Cr3dentialHTTPError suitable for axum responses.
impl IntoResponse for Cr3dentialHTTPError {
    fn into_response(self) -> axum::response::Response {
        let (status, err_message) = match &self {
            err @ Cr3dentialHTTPError::MissingField(_)
            | err @ Cr3dentialHTTPError::InvalidBody(_)
            | err @ Cr3dentialHTTPError::InvalidQuery(_)
            | err @ Cr3dentialHTTPError::InvalidDid(_)
            | err @ Cr3dentialHTTPError::Offer(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            Cr3dentialHTTPError::Resolver(err) => (resolver_status(err), err.to_string()),
            Cr3dentialHTTPError::Issuer(err) => (issuer_status(err), err.to_string()),
            Cr3dentialHTTPError::Claim(err) => (claim_status(err), err.to_string()),
            Cr3dentialHTTPError::Ledger(err) => (ledger_status(err), err.to_string()),
            err @ Cr3dentialHTTPError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
            err @ Cr3dentialHTTPError::Store(_)
            | err @ Cr3dentialHTTPError::Cache(_)
            | err @ Cr3dentialHTTPError::Directory(_)
            | err @ Cr3dentialHTTPError::Catalog(_)
            | err @ Cr3dentialHTTPError::Server(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        let body = match self.orphaned_uri() {
            Some(uri) => Json(json!({ "error": err_message, "orphanedCredentialUri": uri })),
            None => Json(json!({ "error": err_message })),
        };
        (status, body).into_response()
    }
}

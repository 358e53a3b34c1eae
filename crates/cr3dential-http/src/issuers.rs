//! Handler for listing credential issuers.
use crate::errors::Cr3dentialHTTPError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cr3dential_core::directory::IssuerMetadata;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuersResponse {
    pub issuers: Vec<IssuerMetadata>,
}

pub struct Cr3dentialIssuersHTTPHandler;

impl Cr3dentialIssuersHTTPHandler {
    /// Handles get request listing known issuers.
    pub async fn get_issuers(
        State(app_state): State<Arc<AppState>>,
    ) -> Result<impl IntoResponse, Cr3dentialHTTPError> {
        let issuers = app_state.directory.list_issuers().await?;
        Ok((StatusCode::OK, Json(IssuersResponse { issuers })))
    }
}

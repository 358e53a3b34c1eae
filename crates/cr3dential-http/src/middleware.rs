//! Middleware for Cr3dential HTTP.
use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use cr3dential_core::did::{Did, DID_METHOD};
use serde_json::json;

/// Rejects requests whose `:did` path segment is not a well-formed `did:xrpl` identifier.
pub async fn validate_did(
    Path(did): Path<String>,
    request: Request<Body>,
    next: Next<Body>,
) -> impl IntoResponse {
    tracing::info!(did);
    let error = match did.parse::<Did>() {
        Ok(parsed) if parsed.method() == DID_METHOD => return Ok(next.run(request).await),
        Ok(parsed) => format!("Unsupported DID method: {}", parsed.method()),
        Err(err) => format!("Invalid DID: {err}"),
    };
    Err((StatusCode::BAD_REQUEST, Json(json!({ "error": error }))))
}

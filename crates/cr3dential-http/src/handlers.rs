use crate::errors::Cr3dentialHTTPError;
use axum::http::Uri;
use log::debug;

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> Cr3dentialHTTPError {
    debug!("No route for {uri}");
    Cr3dentialHTTPError::NotFound
}

use crate::config::HTTPConfig;
use crate::credentials::Cr3dentialCredentialsHTTPHandler;
use crate::diddocuments::Cr3dentialDidDocumentsHTTPHandler;
use crate::errors::Cr3dentialHTTPError;
use crate::handlers;
use crate::issuers::Cr3dentialIssuersHTTPHandler;
use crate::middleware::validate_did;
use crate::state::AppState;
use axum::routing::{get, post, IntoMakeService};
use axum::{middleware, Router};
use hyper::server::conn::AddrIncoming;
use log::info;
use std::sync::Arc;
use tower::ServiceBuilder;

/// Router of the credential issuance API.
pub struct Cr3dentialRouter {
    router: Router,
}

impl From<Arc<AppState>> for Cr3dentialRouter {
    fn from(app_state: Arc<AppState>) -> Self {
        Self {
            router: Self::generate_router(app_state),
        }
    }
}

impl Cr3dentialRouter {
    fn generate_router(shared_state: Arc<AppState>) -> Router {
        Router::new()
            .route(
                "/credentials/requests",
                post(Cr3dentialCredentialsHTTPHandler::post_request),
            )
            .route(
                "/credentials/offers",
                get(Cr3dentialCredentialsHTTPHandler::get_offer)
                    .post(Cr3dentialCredentialsHTTPHandler::post_offer),
            )
            .route(
                "/credentials",
                get(Cr3dentialCredentialsHTTPHandler::get_credentials),
            )
            .route(
                "/diddocuments",
                post(Cr3dentialDidDocumentsHTTPHandler::post_did_document),
            )
            .route(
                "/diddocuments/:did",
                get(Cr3dentialDidDocumentsHTTPHandler::get_did_document)
                    .layer(ServiceBuilder::new().layer(middleware::from_fn(validate_did))),
            )
            .route("/issuers", get(Cr3dentialIssuersHTTPHandler::get_issuers))
            .fallback(handlers::not_found)
            .with_state(shared_state)
    }

    /// Moves wrapped app router and consumes.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Builds the app state from configuration and binds a server to the configured address.
pub async fn server(
    config: HTTPConfig,
) -> Result<axum::Server<AddrIncoming, IntoMakeService<Router>>, Cr3dentialHTTPError> {
    let addr = config.to_socket_address();
    let shared_state = Arc::new(AppState::new(config).await?);
    let app = Cr3dentialRouter::from(shared_state).into_router();
    let server = axum::Server::try_bind(&addr)?.serve(app.into_make_service());
    info!("Listening on {}", server.local_addr());
    Ok(server)
}

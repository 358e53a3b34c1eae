use axum::http::StatusCode;
use axum_test_helper::TestClient;
use cr3dential_core::claim::ClaimReceipt;
use cr3dential_core::config::CoreConfig;
use cr3dential_core::document::DidDocument;
use cr3dential_core::local::LocalStore;
use cr3dential_core::memory::{MemoryContentStore, MemoryLedger};
use cr3dential_core::offer::CredentialOffer;
use cr3dential_http::config::HTTPConfig;
use cr3dential_http::credentials::{CredentialsResponse, OfferResponse};
use cr3dential_http::diddocuments::{DidDocumentResponse, DidDocumentUpdateResponse};
use cr3dential_http::errors::Cr3dentialHTTPError;
use cr3dential_http::issuers::IssuersResponse;
use cr3dential_http::server::Cr3dentialRouter;
use cr3dential_http::state::AppState;
use cr3dential_xrpl::config::XrplConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const HOLDER_DID: &str = "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const HOLDER_ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const GATEWAY: &str = "https://gateway.test/ipfs";

struct TestApp {
    client: TestClient,
    store: MemoryContentStore,
    ledger: MemoryLedger,
    _dir: TempDir,
}

fn test_app() -> TestApp {
    let store = MemoryContentStore::new(GATEWAY);
    let ledger = MemoryLedger::default();
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new_with_backends(
        HTTPConfig::default(),
        CoreConfig::default(),
        XrplConfig::default(),
        Arc::new(ledger.clone()),
        Arc::new(store.clone()),
        LocalStore::new(dir.path()),
        None,
    )
    .unwrap();
    let app = Cr3dentialRouter::from(Arc::new(state)).into_router();
    TestApp {
        client: TestClient::new(app),
        store,
        ledger,
        _dir: dir,
    }
}

async fn request_offer(client: &TestClient, type_key: &str) -> CredentialOffer {
    let response = client
        .post("/credentials/requests")
        .json(&json!({"did": HOLDER_DID, "email": "holder@example.com", "type": type_key}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<CredentialOffer>().await
}

fn acceptance(offer: &CredentialOffer) -> Value {
    json!({
        "credentialOffer": offer,
        "challenge": "offer123-xyz",
        "signature": "holder-signature"
    })
}

#[tokio::test]
async fn test_not_found() {
    let app = test_app();
    let response = app.client.get("/nonexistent-path").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.text().await,
        json!({"error": Cr3dentialHTTPError::NotFound.to_string()}).to_string()
    );
}

#[tokio::test]
async fn test_claim_credential() {
    let app = test_app();
    let offer = request_offer(&app.client, "42-software-engineering").await;

    let response = app
        .client
        .post("/credentials/offers")
        .json(&acceptance(&offer))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let receipt = response.json::<ClaimReceipt>().await;
    assert_eq!(
        receipt.document.linked_credentials(),
        [receipt.credential.storage.uri.as_str()]
    );
    assert!(app.store.contains(&receipt.credential.storage.uri));
    assert!(app.store.contains(&receipt.did_document_url));
    assert!(receipt.tx_hash.is_none());

    // Holder anchors the returned document, after which resolution follows the pointer.
    app.ledger
        .set_did_uri(HOLDER_ACCOUNT, &receipt.did_document_url);
    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = response.json::<DidDocumentResponse>().await;
    assert_eq!(resolved.uri.as_deref(), Some(receipt.did_document_url.as_str()));
    assert_eq!(resolved.document, receipt.document);

    let response = app
        .client
        .get(&format!("/credentials?did={HOLDER_DID}"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = response.json::<CredentialsResponse>().await;
    assert_eq!(listed.credentials.len(), 1);
    assert_eq!(listed.credentials[0], receipt.credential);
}

#[tokio::test]
async fn test_claim_twice_conflicts() {
    let app = test_app();
    let offer = request_offer(&app.client, "xrpl-training").await;
    let response = app
        .client
        .post("/credentials/offers")
        .json(&acceptance(&offer))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let uploads = app.store.upload_count();

    let offer = request_offer(&app.client, "xrpl-training").await;
    let response = app
        .client
        .post("/credentials/offers")
        .json(&acceptance(&offer))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.store.upload_count(), uploads);
}

#[tokio::test]
async fn test_invalid_requests() {
    let app = test_app();

    let response = app
        .client
        .post("/credentials/requests")
        .json(&json!({"did": HOLDER_DID, "type": "xrpl-training"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await,
        json!({"error": Cr3dentialHTTPError::MissingField("email").to_string()}).to_string()
    );

    let response = app
        .client
        .post("/credentials/requests")
        .json(&json!({"did": HOLDER_DID, "email": "holder@example.com", "type": "unknown"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .post("/credentials/offers")
        .json(&json!({"challenge": "offer123-xyz", "signature": "sig"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.client.get("/credentials").send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.upload_count(), 0);
}

#[tokio::test]
async fn test_offer_preview() {
    let app = test_app();
    let response = app
        .client
        .get("/credentials/offers?type=easya-training")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let preview = response.json::<OfferResponse>().await;
    assert_eq!(preview.credential_offer.type_key, "easya-training");
    assert!(preview.issuer.is_some());

    let response = app.client.get("/credentials/offers?type=unknown").send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resolve_default_document() {
    let app = test_app();
    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = response.json::<DidDocumentResponse>().await;
    assert!(resolved.uri.is_none());
    assert_eq!(resolved.document.id, HOLDER_DID);
    assert!(resolved.document.linked_credentials().is_empty());
    assert_eq!(app.store.upload_count(), 0);

    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}?network=devnet"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}?network=moonnet"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.client.get("/diddocuments/did:web:example.com").send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed DIDs of other methods are rejected before resolution.
    let other_method = HOLDER_DID.replacen("xrpl", "web", 1);
    let connects = app.ledger.connect_count();
    let response = app
        .client
        .get(&format!("/diddocuments/{other_method}"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await,
        json!({"error": "Unsupported DID method: web"}).to_string()
    );
    assert_eq!(app.ledger.connect_count(), connects);
}

#[tokio::test]
async fn test_ledger_unreachable() {
    let app = test_app();
    app.ledger.set_unreachable(true);
    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_post_did_document() {
    let app = test_app();
    let response = app
        .client
        .get(&format!("/diddocuments/{HOLDER_DID}"))
        .send()
        .await;
    let document: DidDocument = response.json::<DidDocumentResponse>().await.document;
    let pointer = format!("{GATEWAY}/QmCredential");

    let response = app
        .client
        .post("/diddocuments")
        .json(&json!({"didDocument": document, "credentialHash": pointer}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<DidDocumentUpdateResponse>().await;
    assert_eq!(updated.document.linked_credentials(), [pointer.as_str()]);
    assert!(app.store.contains(&updated.did_document_url));

    let response = app
        .client
        .post("/diddocuments")
        .json(&json!({"credentialHash": pointer}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_issuers() {
    let app = test_app();
    let response = app.client.get("/issuers").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let issuers = response.json::<IssuersResponse>().await.issuers;
    assert!(!issuers.is_empty());
    assert!(issuers.iter().all(|issuer| issuer.did.is_some()));
}

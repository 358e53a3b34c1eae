use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cr3dential_core::anchor::{FinalityConfig, LedgerAnchor};
use cr3dential_core::document::DidDocument;
use cr3dential_core::ledger::{
    encode_uri, Balance, LedgerClient, LedgerConnector, LedgerError, Network, NetworkConfig,
    DID_OBJECT_TYPE,
};
use cr3dential_core::memory::MemoryContentStore;
use cr3dential_core::resolver::Resolver;
use cr3dential_core::store::upload_json;
use cr3dential_xrpl::{RpcSigner, XrplConnector};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

const HOLDER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const SIGNED_HASH: &str = "C53ECF838647FA5A4C780377025FEC7999AB4182590510CA461444B207AB74A9";
const PENDING_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

struct FakeLedger {
    did_uri: Option<String>,
}

fn error(code: &str) -> Value {
    json!({ "result": { "status": "error", "error": code, "error_message": code } })
}

async fn rippled(State(ledger): State<Arc<FakeLedger>>, Json(body): Json<Value>) -> Json<Value> {
    let params = &body["params"][0];
    let account = params["account"].as_str().unwrap_or_default();
    let response = match body["method"].as_str().unwrap_or_default() {
        "server_info" => json!({ "result": { "status": "success", "info": { "build_version": "2.2.0" } } }),
        "account_info" | "account_objects" | "account_lines" if account != HOLDER => {
            error("actNotFound")
        }
        "account_info" => json!({ "result": {
            "status": "success",
            "account_data": { "Account": HOLDER, "Balance": "25000012", "Sequence": 9 }
        } }),
        "account_objects" => {
            let objects: Vec<Value> = ledger
                .did_uri
                .iter()
                .map(|uri| json!({ "LedgerEntryType": "DID", "Account": HOLDER, "URI": encode_uri(uri) }))
                .collect();
            json!({ "result": { "status": "success", "account_objects": objects } })
        }
        "account_lines" => json!({ "result": {
            "status": "success",
            "lines": [{ "account": "rIssuer", "balance": "10", "currency": "USD" }]
        } }),
        "wallet_propose" => json!({ "result": {
            "status": "success",
            "account_id": HOLDER,
            "public_key_hex": "0330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020"
        } }),
        "sign" => {
            assert_eq!(params["tx_json"]["Sequence"], 9);
            assert_eq!(params["tx_json"]["TransactionType"], "DIDSet");
            json!({ "result": { "status": "success", "tx_blob": "1200", "tx_json": { "hash": SIGNED_HASH } } })
        }
        "submit" => json!({ "result": {
            "status": "success",
            "engine_result": "tesSUCCESS",
            "engine_result_message": "The transaction was applied."
        } }),
        "tx" if params["transaction"] == SIGNED_HASH => json!({ "result": {
            "status": "success",
            "validated": true,
            "meta": { "TransactionResult": "tesSUCCESS" }
        } }),
        "tx" if params["transaction"] == PENDING_HASH => json!({ "result": {
            "status": "success",
            "validated": false
        } }),
        "tx" => error("txnNotFound"),
        _ => error("unknownCmd"),
    };
    Json(response)
}

fn spawn_rippled(did_uri: Option<String>) -> NetworkConfig {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/", post(rippled))
        .with_state(Arc::new(FakeLedger { did_uri }));
    tokio::spawn(axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service()));
    NetworkConfig::new(Network::Testnet)
        .with_rpc_url(&format!("http://{addr}/"))
        .with_request_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_account_queries() {
    let network = spawn_rippled(None);
    let client = XrplConnector.connect(&network).await.unwrap();

    let info = client.account_info(HOLDER).await.unwrap();
    assert_eq!(info.sequence, 9);
    assert_eq!(info.balance_drops, 25_000_012);
    assert_eq!(
        client.account_info("rUnknown").await,
        Err(LedgerError::AccountNotFound("rUnknown".to_string()))
    );
    assert!(client
        .account_objects(HOLDER, DID_OBJECT_TYPE)
        .await
        .unwrap()
        .is_empty());

    let balances = client.balances(HOLDER).await.unwrap();
    assert_eq!(balances[0], Balance::xrp(25_000_012));
    assert_eq!(balances[0].value, "25.000012");
    assert_eq!(balances[1].issuer.as_deref(), Some("rIssuer"));
    assert_eq!(
        client.balances("rUnknown").await.unwrap(),
        vec![Balance::xrp(0)]
    );

    assert_eq!(
        client.transaction("ABCD").await,
        Err(LedgerError::TransactionNotFound("ABCD".to_string()))
    );
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_anchor_with_rpc_signer() {
    let network = spawn_rippled(None);
    let signer = RpcSigner::from_seed(&network, "sEdTestSeed").await.unwrap();
    let anchor = LedgerAnchor::new(
        Arc::new(XrplConnector),
        Arc::new(signer),
        network.clone(),
        FinalityConfig {
            settle_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(2),
        },
    );
    let receipt = anchor
        .anchor_uri("https://gateway.pinata.cloud/ipfs/QmDocument")
        .await
        .unwrap();
    assert_eq!(receipt.tx_hash, SIGNED_HASH);
    assert_eq!(
        receipt.explorer_url,
        format!("https://testnet.xrpl.org/transactions/{SIGNED_HASH}")
    );
}

#[tokio::test]
async fn test_resolve_anchored_document() {
    let store = MemoryContentStore::new("https://gateway.test/ipfs");
    let did = format!("did:xrpl:1:{HOLDER}").parse().unwrap();
    let document = DidDocument::synthesize_default(&did);
    let stored = upload_json(&store, &document, "document").await.unwrap();

    let network = spawn_rippled(Some(stored.uri.clone()));
    let resolver = Resolver::new(Arc::new(XrplConnector), Arc::new(store));
    let resolution = resolver
        .resolve(&network, &format!("did:xrpl:1:{HOLDER}"))
        .await
        .unwrap();
    assert_eq!(resolution.uri.as_deref(), Some(stored.uri.as_str()));
    assert_eq!(resolution.document, document);
}

#[tokio::test]
async fn test_unreachable_node() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let network = NetworkConfig::default()
        .with_rpc_url(&format!("http://{addr}/"))
        .with_request_timeout(Duration::from_secs(2));
    assert!(matches!(
        XrplConnector.connect(&network).await,
        Err(LedgerError::Connection(_)) | Err(LedgerError::Timeout(_))
    ));
}

#[tokio::test]
#[ignore = "Integration test requires XRPL testnet access."]
async fn test_testnet_faucet() {
    let network = NetworkConfig::new(Network::Testnet);
    let client = XrplConnector.connect(&network).await.unwrap();
    let wallet = client.fund_wallet().await.unwrap();
    assert!(wallet.account.starts_with('r'));
}

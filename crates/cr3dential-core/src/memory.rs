//! In-memory ledger, signer and content store for local runs and tests.
use crate::did::ACCOUNT_ALPHABET;
use crate::ledger::{
    AccountInfo, Balance, DidSetTransaction, FundedWallet, LedgerClient, LedgerConnector,
    LedgerError, LedgerObject, NetworkConfig, SignedTransaction, SubmitResponse,
    TransactionSigner, TransactionStatus, DID_OBJECT_TYPE, SUCCESS_RESULT,
};
use crate::store::{content_id_from_uri, join_gateway, ContentStore, StoreError};
use crate::utils::sha256_hex;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const FAUCET_DROPS: u64 = 100_000_000;
const DID_SET_FEE_DROPS: u64 = 12;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct StoreState {
    objects: HashMap<String, Vec<u8>>,
    uploads: usize,
    fetches: usize,
    fail_uploads: bool,
    upload_limit: Option<usize>,
    unreachable: bool,
}

/// Content store keyed by the hex SHA-256 digest of each payload.
#[derive(Debug, Clone)]
pub struct MemoryContentStore {
    gateway: String,
    state: Arc<Mutex<StoreState>>,
}

impl MemoryContentStore {
    pub fn new(gateway: &str) -> Self {
        Self {
            gateway: gateway.to_owned(),
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// Makes subsequent uploads fail.
    pub fn set_fail_uploads(&self, fail: bool) {
        lock(&self.state).fail_uploads = fail;
    }

    /// Makes uploads fail once `limit` uploads have succeeded.
    pub fn set_upload_limit(&self, limit: usize) {
        lock(&self.state).upload_limit = Some(limit);
    }

    /// Makes subsequent fetches fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.state).unreachable = unreachable;
    }

    pub fn upload_count(&self) -> usize {
        lock(&self.state).uploads
    }

    pub fn fetch_count(&self) -> usize {
        lock(&self.state).fetches
    }

    pub fn contains(&self, uri: &str) -> bool {
        let content_id = content_id_from_uri(uri).unwrap_or(uri);
        lock(&self.state).objects.contains_key(content_id)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upload(&self, payload: Vec<u8>, _name: &str) -> Result<String, StoreError> {
        let mut state = lock(&self.state);
        let limit_reached = state
            .upload_limit
            .is_some_and(|limit| state.uploads >= limit);
        if state.fail_uploads || limit_reached {
            return Err(StoreError::Upload("store rejected upload".to_owned()));
        }
        let content_id = sha256_hex(&payload);
        state.objects.insert(content_id.clone(), payload);
        state.uploads += 1;
        Ok(content_id)
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, StoreError> {
        let mut state = lock(&self.state);
        state.fetches += 1;
        if state.unreachable {
            return Err(StoreError::fetch(uri, "store unreachable"));
        }
        let content_id = content_id_from_uri(uri).unwrap_or(uri);
        state
            .objects
            .get(content_id)
            .cloned()
            .ok_or_else(|| StoreError::fetch(uri, "content not found"))
    }

    fn retrieval_uri(&self, content_id: &str) -> String {
        join_gateway(&self.gateway, content_id)
    }
}

#[derive(Debug, Default)]
struct MemoryAccount {
    sequence: u32,
    balance_drops: u64,
    did_uri: Option<String>,
    trust_lines: Vec<Balance>,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<String, MemoryAccount>,
    transactions: HashMap<String, TransactionStatus>,
    next_rejection: Option<String>,
    unreachable: bool,
    wallets_funded: u64,
    connects: usize,
    disconnects: usize,
}

/// Ledger that validates DID Set transactions immediately and enforces account sequences.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    network: NetworkConfig,
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Creates or tops up an account. New accounts start at sequence 1.
    pub fn fund_account(&self, account: &str, drops: u64) {
        let mut state = lock(&self.state);
        let entry = state
            .accounts
            .entry(account.to_owned())
            .or_insert_with(|| MemoryAccount {
                sequence: 1,
                ..MemoryAccount::default()
            });
        entry.balance_drops += drops;
    }

    /// Sets the raw (possibly hex encoded) DID record URI of an existing or new account.
    pub fn set_did_uri(&self, account: &str, uri: &str) {
        self.fund_account(account, 0);
        if let Some(entry) = lock(&self.state).accounts.get_mut(account) {
            entry.did_uri = Some(uri.to_owned());
        }
    }

    /// Raw DID record URI of an account.
    pub fn did_uri(&self, account: &str) -> Option<String> {
        lock(&self.state)
            .accounts
            .get(account)
            .and_then(|entry| entry.did_uri.clone())
    }

    pub fn add_trust_line(&self, account: &str, balance: Balance) {
        self.fund_account(account, 0);
        if let Some(entry) = lock(&self.state).accounts.get_mut(account) {
            entry.trust_lines.push(balance);
        }
    }

    /// Rejects the next submitted transaction with the given engine result.
    pub fn reject_next_submit(&self, code: &str) {
        lock(&self.state).next_rejection = Some(code.to_owned());
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.state).unreachable = unreachable;
    }

    pub fn connect_count(&self) -> usize {
        lock(&self.state).connects
    }

    pub fn disconnect_count(&self) -> usize {
        lock(&self.state).disconnects
    }
}

/// Deterministic account address for the n-th faucet wallet.
fn generated_account(index: u64) -> String {
    let alphabet = ACCOUNT_ALPHABET.as_bytes();
    let digest = Sha256::digest(index.to_be_bytes());
    std::iter::once('r')
        .chain(
            digest
                .iter()
                .map(|byte| alphabet[usize::from(*byte) % alphabet.len()] as char),
        )
        .collect()
}

fn submit_response(engine_result: &str, engine_result_message: &str) -> SubmitResponse {
    SubmitResponse {
        engine_result: engine_result.to_owned(),
        engine_result_message: engine_result_message.to_owned(),
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    fn network_config(&self) -> &NetworkConfig {
        &self.network
    }

    async fn account_objects(
        &self,
        account: &str,
        object_type: &str,
    ) -> Result<Vec<LedgerObject>, LedgerError> {
        let state = lock(&self.state);
        let entry = state
            .accounts
            .get(account)
            .ok_or_else(|| LedgerError::AccountNotFound(account.to_owned()))?;
        if object_type != DID_OBJECT_TYPE {
            return Ok(Vec::new());
        }
        Ok(entry
            .did_uri
            .iter()
            .map(|uri| LedgerObject {
                ledger_entry_type: "DID".to_owned(),
                account: account.to_owned(),
                uri: Some(uri.clone()),
            })
            .collect())
    }

    async fn account_info(&self, account: &str) -> Result<AccountInfo, LedgerError> {
        lock(&self.state)
            .accounts
            .get(account)
            .map(|entry| AccountInfo {
                account: account.to_owned(),
                sequence: entry.sequence,
                balance_drops: entry.balance_drops,
            })
            .ok_or_else(|| LedgerError::AccountNotFound(account.to_owned()))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError> {
        let did_set: DidSetTransaction = hex::decode(&tx.tx_blob)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| LedgerError::Rpc(format!("invalid tx_blob for {}", tx.hash)))?;
        let mut state = lock(&self.state);
        if let Some(code) = state.next_rejection.take() {
            return Ok(submit_response(&code, "rejected by ledger"));
        }
        let Some(entry) = state.accounts.get_mut(&did_set.account) else {
            return Ok(submit_response("terNO_ACCOUNT", "source account does not exist"));
        };
        if did_set.sequence < entry.sequence {
            return Ok(submit_response("tefPAST_SEQ", "sequence already used"));
        }
        if did_set.sequence > entry.sequence {
            return Ok(submit_response("terPRE_SEQ", "missing prior sequence"));
        }
        entry.sequence += 1;
        entry.balance_drops = entry.balance_drops.saturating_sub(DID_SET_FEE_DROPS);
        entry.did_uri = Some(did_set.uri);
        state.transactions.insert(
            tx.hash.clone(),
            TransactionStatus {
                hash: tx.hash.clone(),
                validated: true,
                result: Some(SUCCESS_RESULT.to_owned()),
            },
        );
        Ok(submit_response(SUCCESS_RESULT, "applied"))
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        lock(&self.state)
            .transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(hash.to_owned()))
    }

    async fn balances(&self, account: &str) -> Result<Vec<Balance>, LedgerError> {
        let state = lock(&self.state);
        Ok(match state.accounts.get(account) {
            Some(entry) => std::iter::once(Balance::xrp(entry.balance_drops))
                .chain(entry.trust_lines.iter().cloned())
                .collect(),
            None => vec![Balance::xrp(0)],
        })
    }

    async fn fund_wallet(&self) -> Result<FundedWallet, LedgerError> {
        if self.network.faucet_url().is_none() {
            return Err(LedgerError::FaucetUnavailable(self.network.network));
        }
        let index = {
            let mut state = lock(&self.state);
            state.wallets_funded += 1;
            state.wallets_funded
        };
        let account = generated_account(index);
        self.fund_account(&account, FAUCET_DROPS);
        Ok(FundedWallet {
            account,
            seed: None,
            balance: Balance::xrp(FAUCET_DROPS).value,
        })
    }

    async fn disconnect(&self) -> Result<(), LedgerError> {
        lock(&self.state).disconnects += 1;
        Ok(())
    }
}

#[async_trait]
impl LedgerConnector for MemoryLedger {
    async fn connect(&self, config: &NetworkConfig) -> Result<Box<dyn LedgerClient>, LedgerError> {
        let mut state = lock(&self.state);
        if state.unreachable {
            return Err(LedgerError::Connection(config.rpc_url.clone()));
        }
        state.connects += 1;
        Ok(Box::new(Self {
            network: config.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Signer whose blob is the hex encoded transaction JSON and whose hash is its SHA-256.
#[derive(Debug, Clone)]
pub struct MemorySigner {
    account: String,
    public_key_hex: String,
}

impl MemorySigner {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_owned(),
            public_key_hex: format!("02{}", sha256_hex(account.as_bytes())).to_uppercase(),
        }
    }
}

#[async_trait]
impl TransactionSigner for MemorySigner {
    fn account(&self) -> &str {
        &self.account
    }

    fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    async fn sign(&self, tx: &DidSetTransaction) -> Result<SignedTransaction, LedgerError> {
        let blob = serde_json::to_vec(tx).map_err(|err| LedgerError::Signing(err.to_string()))?;
        Ok(SignedTransaction {
            hash: sha256_hex(&blob).to_uppercase(),
            tx_blob: hex::encode_upper(blob),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HOLDER_ACCOUNT, TEST_GATEWAY};
    use crate::did::is_valid_account;
    use crate::ledger::Network;

    #[tokio::test]
    async fn test_content_store() {
        let store = MemoryContentStore::new(TEST_GATEWAY);
        let content_id = store.upload(b"payload".to_vec(), "name").await.unwrap();
        assert_eq!(content_id, sha256_hex(b"payload"));
        let uri = store.retrieval_uri(&content_id);
        assert!(store.contains(&uri));
        assert_eq!(store.fetch(&uri).await.unwrap(), b"payload".to_vec());
        assert!(matches!(
            store.fetch(&format!("{TEST_GATEWAY}/missing")).await,
            Err(StoreError::Fetch { .. })
        ));
        assert_eq!(store.fetch_count(), 2);

        store.set_fail_uploads(true);
        assert!(matches!(
            store.upload(b"other".to_vec(), "name").await,
            Err(StoreError::Upload(_))
        ));
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_balances() {
        let ledger = MemoryLedger::default();
        assert_eq!(
            ledger.balances(HOLDER_ACCOUNT).await.unwrap(),
            vec![Balance::xrp(0)]
        );
        ledger.fund_account(HOLDER_ACCOUNT, 25_500_000);
        ledger.add_trust_line(
            HOLDER_ACCOUNT,
            Balance {
                currency: "EUR".to_string(),
                value: "10".to_string(),
                issuer: Some("rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe".to_string()),
            },
        );
        let balances = ledger.balances(HOLDER_ACCOUNT).await.unwrap();
        assert_eq!(balances[0].value, "25.5");
        assert_eq!(balances[1].currency, "EUR");
    }

    #[tokio::test]
    async fn test_fund_wallet() {
        let ledger = MemoryLedger::default();
        let wallet = ledger.fund_wallet().await.unwrap();
        assert!(is_valid_account(&wallet.account));
        assert_eq!(wallet.balance, "100");
        assert_eq!(
            ledger.account_info(&wallet.account).await.unwrap().sequence,
            1
        );
        assert_ne!(ledger.fund_wallet().await.unwrap().account, wallet.account);

        let mainnet = MemoryLedger::new(NetworkConfig::new(Network::Mainnet));
        assert_eq!(
            mainnet.fund_wallet().await,
            Err(LedgerError::FaucetUnavailable(Network::Mainnet))
        );
    }

    #[tokio::test]
    async fn test_connect() {
        let ledger = MemoryLedger::default();
        let client = ledger
            .connect(&NetworkConfig::new(Network::Devnet))
            .await
            .unwrap();
        assert_eq!(client.network_config().network, Network::Devnet);
        client.disconnect().await.unwrap();
        assert_eq!(ledger.disconnect_count(), 1);

        ledger.set_unreachable(true);
        assert!(matches!(
            ledger.connect(&NetworkConfig::default()).await,
            Err(LedgerError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_reject_next_submit() {
        let ledger = MemoryLedger::default();
        ledger.fund_account(HOLDER_ACCOUNT, FAUCET_DROPS);
        ledger.reject_next_submit("tecNO_PERMISSION");
        let signer = MemorySigner::new(HOLDER_ACCOUNT);
        let signed = signer
            .sign(&DidSetTransaction::new(HOLDER_ACCOUNT, "uri", 1))
            .await
            .unwrap();
        assert_eq!(
            ledger.submit(&signed).await.unwrap().engine_result,
            "tecNO_PERMISSION"
        );
        assert!(ledger.submit(&signed).await.unwrap().is_success());
        assert!(ledger.transaction(&signed.hash).await.unwrap().validated);
    }
}

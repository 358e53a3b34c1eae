//! Ledger collaborator traits and types.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Ledger object type of DID records.
pub const DID_OBJECT_TYPE: &str = "did";

/// Engine result of a successful transaction.
pub const SUCCESS_RESULT: &str = "tesSUCCESS";

/// Fixed fee of DID Set transactions, in drops.
pub const DID_SET_FEE: &str = "12";

const DROPS_PER_XRP: u64 = 1_000_000;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An error relating to ledger access, signing or transaction finality.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Ledger node unreachable.
    #[error("Failed to connect to ledger: {0}")]
    Connection(String),
    /// Request did not complete within the configured bound.
    #[error("Ledger request timed out: {0}")]
    Timeout(String),
    /// Account does not exist on the ledger.
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    /// Transaction unknown to the ledger.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    /// Transaction rejected with a non-success engine result.
    #[error("Transaction rejected with {code}: {message}")]
    Rejected { code: String, message: String },
    /// Transaction not validated before the finality timeout.
    #[error("Transaction {0} not validated before timeout.")]
    NotValidated(String),
    /// Signing key unavailable or signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),
    /// Malformed or unexpected ledger response.
    #[error("Ledger RPC error: {0}")]
    Rpc(String),
    /// Faucet requested on a network without one.
    #[error("No faucet available on {0}.")]
    FaucetUnavailable(Network),
    /// Network name not recognised.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

impl LedgerError {
    /// Whether the rejection was caused by a stale or future account sequence.
    pub fn is_sequence_conflict(&self) -> bool {
        matches!(self, LedgerError::Rejected { code, .. }
            if code == "tefPAST_SEQ" || code == "terPRE_SEQ")
    }
}

/// Ledger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
}

impl Network {
    /// Public JSON-RPC endpoint.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://s1.ripple.com:51234/",
            Network::Testnet => "https://s.altnet.rippletest.net:51234/",
            Network::Devnet => "https://s.devnet.rippletest.net:51234/",
        }
    }

    /// Faucet endpoint, test networks only.
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Testnet => Some("https://faucet.altnet.rippletest.net/accounts"),
            Network::Devnet => Some("https://faucet.devnet.rippletest.net/accounts"),
        }
    }

    /// Explorer page of a transaction.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        let host = match self {
            Network::Mainnet => "livenet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        };
        format!("https://{host}.xrpl.org/transactions/{tx_hash}")
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(network: &str) -> Result<Self, Self::Err> {
        match network.to_ascii_lowercase().as_str() {
            "mainnet" | "livenet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            _ => Err(LedgerError::UnknownNetwork(network.to_owned())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let network = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        };
        write!(f, "{network}")
    }
}

/// Network selection passed explicitly to every ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: String,
    pub request_timeout: Duration,
}

impl NetworkConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            rpc_url: network.rpc_url().to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: &str) -> Self {
        self.rpc_url = rpc_url.to_owned();
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn faucet_url(&self) -> Option<&'static str> {
        self.network.faucet_url()
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        self.network.explorer_tx_url(tx_hash)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

/// A ledger object owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedgerObject {
    pub ledger_entry_type: String,
    pub account: String,
    /// Pointer URI, hex encoded on the ledger.
    #[serde(rename = "URI", default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub account: String,
    pub sequence: u32,
    pub balance_drops: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl Balance {
    pub fn xrp(drops: u64) -> Self {
        Self {
            currency: "XRP".to_owned(),
            value: drops_to_xrp(drops),
            issuer: None,
        }
    }
}

/// A test network wallet funded by the faucet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundedWallet {
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub balance: String,
}

/// Unsigned transaction pointing an account's DID record at a URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DidSetTransaction {
    pub transaction_type: String,
    pub account: String,
    #[serde(rename = "URI")]
    pub uri: String,
    pub fee: String,
    pub sequence: u32,
    pub flags: u32,
}

impl DidSetTransaction {
    /// Builds a DID Set transaction with `URI = upper-case hex(uri)`.
    pub fn new(account: &str, uri: &str, sequence: u32) -> Self {
        Self {
            transaction_type: "DIDSet".to_owned(),
            account: account.to_owned(),
            uri: encode_uri(uri),
            fee: DID_SET_FEE.to_owned(),
            sequence,
            flags: 0,
        }
    }

    pub fn to_tx_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx_blob: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub engine_result: String,
    pub engine_result_message: String,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        self.engine_result == SUCCESS_RESULT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    pub hash: String,
    pub validated: bool,
    /// Final result once validated, e.g. `tesSUCCESS`.
    pub result: Option<String>,
}

/// A connected ledger session.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    fn network_config(&self) -> &NetworkConfig;

    /// Ledger objects of the given type owned by `account`.
    async fn account_objects(
        &self,
        account: &str,
        object_type: &str,
    ) -> Result<Vec<LedgerObject>, LedgerError>;

    async fn account_info(&self, account: &str) -> Result<AccountInfo, LedgerError>;

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError>;

    async fn transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError>;

    /// XRP balance first, then trust line balances. A missing account has a zero XRP balance.
    async fn balances(&self, account: &str) -> Result<Vec<Balance>, LedgerError>;

    /// Creates and funds a new account from the network faucet.
    async fn fund_wallet(&self) -> Result<FundedWallet, LedgerError>;

    async fn disconnect(&self) -> Result<(), LedgerError>;
}

/// Opens ledger sessions for a network.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn connect(&self, config: &NetworkConfig) -> Result<Box<dyn LedgerClient>, LedgerError>;
}

/// Signing capability for an account's transactions.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Account whose key signs.
    fn account(&self) -> &str;

    /// Hex encoded public key of the signing key.
    fn public_key_hex(&self) -> &str;

    async fn sign(&self, tx: &DidSetTransaction) -> Result<SignedTransaction, LedgerError>;
}

/// Upper-case hex encoding of a pointer URI.
pub fn encode_uri(uri: &str) -> String {
    hex::encode_upper(uri.as_bytes())
}

/// Formats a drops amount as XRP.
pub fn drops_to_xrp(drops: u64) -> String {
    let whole = drops / DROPS_PER_XRP;
    let fraction = drops % DROPS_PER_XRP;
    if fraction == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{fraction:06}")
            .trim_end_matches('0')
            .to_owned()
    }
}

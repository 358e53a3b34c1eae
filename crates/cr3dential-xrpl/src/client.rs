//! XRPL ledger client over rippled JSON-RPC.
use crate::rpc::{transport_error, JsonRpc, RpcError, ACCOUNT_NOT_FOUND, TRANSACTION_NOT_FOUND};
use async_trait::async_trait;
use cr3dential_core::ledger::{
    AccountInfo, Balance, FundedWallet, LedgerClient, LedgerConnector, LedgerError, LedgerObject,
    NetworkConfig, SignedTransaction, SubmitResponse, TransactionStatus,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};

const VALIDATED: &str = "validated";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountData {
    account: String,
    /// Drops, as a decimal string.
    balance: String,
    sequence: u32,
}

#[derive(Debug, Deserialize)]
struct TrustLine {
    account: String,
    balance: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaucetAccount {
    #[serde(default)]
    classic_address: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FaucetResponse {
    account: FaucetAccount,
    #[serde(default)]
    seed: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    balance: Option<Value>,
}

fn parse<T: for<'de> Deserialize<'de>>(method: &str, value: Value) -> Result<T, LedgerError> {
    serde_json::from_value(value)
        .map_err(|err| LedgerError::Rpc(format!("{method}: unexpected response: {err}")))
}

/// Converts an `account_info` result.
pub fn parse_account_info(result: Value) -> Result<AccountInfo, LedgerError> {
    let data: AccountData = parse("account_info", result["account_data"].clone())?;
    let balance_drops = data
        .balance
        .parse()
        .map_err(|_| LedgerError::Rpc(format!("account_info: invalid balance {}", data.balance)))?;
    Ok(AccountInfo {
        account: data.account,
        sequence: data.sequence,
        balance_drops,
    })
}

/// Converts a `tx` result.
pub fn parse_transaction(hash: &str, result: &Value) -> TransactionStatus {
    TransactionStatus {
        hash: hash.to_owned(),
        validated: result[VALIDATED].as_bool().unwrap_or(false),
        result: result["meta"]["TransactionResult"]
            .as_str()
            .map(str::to_owned),
    }
}

/// Converts a faucet response.
fn parse_faucet(response: FaucetResponse) -> Result<FundedWallet, LedgerError> {
    let account = response
        .account
        .classic_address
        .or(response.account.address)
        .ok_or_else(|| LedgerError::Rpc("faucet: response missing account".to_owned()))?;
    let balance = response
        .balance
        .or(response.amount)
        .map(|value| match value {
            Value::String(value) => value,
            value => value.to_string(),
        })
        .unwrap_or_else(|| "0".to_owned());
    Ok(FundedWallet {
        account,
        seed: response.seed,
        balance,
    })
}

/// A session with a rippled JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct XrplClient {
    rpc: JsonRpc,
    network: NetworkConfig,
}

impl XrplClient {
    pub fn new(network: &NetworkConfig) -> Result<Self, LedgerError> {
        Ok(Self {
            rpc: JsonRpc::new(&network.rpc_url, network.request_timeout)?,
            network: network.clone(),
        })
    }

    pub fn rpc(&self) -> &JsonRpc {
        &self.rpc
    }

    /// Checks the node answers `server_info`.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        let result = self.rpc.request("server_info", json!({})).await?;
        debug!(
            "Connected to {} ({})",
            self.rpc.url(),
            result["info"]["build_version"].as_str().unwrap_or("unknown build")
        );
        Ok(())
    }

    async fn account_lines(&self, account: &str) -> Result<Vec<Balance>, LedgerError> {
        let result = self
            .rpc
            .request(
                "account_lines",
                json!({ "account": account, "ledger_index": VALIDATED }),
            )
            .await?;
        let lines: Vec<TrustLine> = parse("account_lines", result["lines"].clone())?;
        Ok(lines
            .into_iter()
            .map(|line| Balance {
                currency: line.currency,
                value: line.balance,
                issuer: Some(line.account),
            })
            .collect())
    }
}

fn account_error(account: &str, err: RpcError) -> LedgerError {
    match err.code() {
        Some(ACCOUNT_NOT_FOUND) => LedgerError::AccountNotFound(account.to_owned()),
        _ => err.into(),
    }
}

#[async_trait]
impl LedgerClient for XrplClient {
    fn network_config(&self) -> &NetworkConfig {
        &self.network
    }

    async fn account_objects(
        &self,
        account: &str,
        object_type: &str,
    ) -> Result<Vec<LedgerObject>, LedgerError> {
        let result = self
            .rpc
            .request(
                "account_objects",
                json!({ "account": account, "type": object_type, "ledger_index": VALIDATED }),
            )
            .await
            .map_err(|err| account_error(account, err))?;
        parse("account_objects", result["account_objects"].clone())
    }

    async fn account_info(&self, account: &str) -> Result<AccountInfo, LedgerError> {
        let result = self
            .rpc
            .request(
                "account_info",
                json!({ "account": account, "ledger_index": "current" }),
            )
            .await
            .map_err(|err| account_error(account, err))?;
        parse_account_info(result)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError> {
        let result = self
            .rpc
            .request("submit", json!({ "tx_blob": tx.tx_blob }))
            .await?;
        let engine_result = result["engine_result"]
            .as_str()
            .ok_or_else(|| LedgerError::Rpc("submit: response missing engine_result".to_owned()))?;
        Ok(SubmitResponse {
            engine_result: engine_result.to_owned(),
            engine_result_message: result["engine_result_message"]
                .as_str()
                .unwrap_or_default()
                .to_owned(),
        })
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        match self.rpc.request("tx", json!({ "transaction": hash })).await {
            Ok(result) => Ok(parse_transaction(hash, &result)),
            Err(err) if err.code() == Some(TRANSACTION_NOT_FOUND) => {
                Err(LedgerError::TransactionNotFound(hash.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn balances(&self, account: &str) -> Result<Vec<Balance>, LedgerError> {
        let xrp = match self.account_info(account).await {
            Ok(info) => Balance::xrp(info.balance_drops),
            Err(LedgerError::AccountNotFound(_)) => return Ok(vec![Balance::xrp(0)]),
            Err(err) => return Err(err),
        };
        let mut balances = vec![xrp];
        balances.extend(self.account_lines(account).await?);
        Ok(balances)
    }

    async fn fund_wallet(&self) -> Result<FundedWallet, LedgerError> {
        let faucet = self
            .network
            .faucet_url()
            .ok_or(LedgerError::FaucetUnavailable(self.network.network))?;
        let response = self
            .rpc
            .http()
            .post(faucet)
            .json(&json!({}))
            .send()
            .await
            .map_err(|err| transport_error(faucet, err))?;
        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!(
                "faucet: HTTP {}",
                response.status()
            )));
        }
        let response: FaucetResponse = response
            .json()
            .await
            .map_err(|err| LedgerError::Rpc(format!("faucet: unexpected response: {err}")))?;
        let wallet = parse_faucet(response)?;
        info!("Funded {} with {} XRP", wallet.account, wallet.balance);
        Ok(wallet)
    }

    async fn disconnect(&self) -> Result<(), LedgerError> {
        // HTTP sessions hold no server-side state.
        debug!("Disconnected from {}", self.rpc.url());
        Ok(())
    }
}

/// Opens [`XrplClient`] sessions, checking the node is reachable first.
#[derive(Debug, Clone, Default)]
pub struct XrplConnector;

#[async_trait]
impl LedgerConnector for XrplConnector {
    async fn connect(&self, config: &NetworkConfig) -> Result<Box<dyn LedgerClient>, LedgerError> {
        let client = XrplClient::new(config)?;
        client.ping().await.map_err(|err| match err {
            LedgerError::Connection(_) | LedgerError::Timeout(_) => err,
            err => LedgerError::Connection(err.to_string()),
        })?;
        Ok(Box::new(client))
    }
}

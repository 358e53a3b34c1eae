//! Minimal XRPL JSON-RPC transport.
use cr3dential_core::ledger::LedgerError;
use log::debug;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// rippled error code of an unknown account.
pub const ACCOUNT_NOT_FOUND: &str = "actNotFound";
/// rippled error code of an unknown transaction.
pub const TRANSACTION_NOT_FOUND: &str = "txnNotFound";

/// An error relating to a single JSON-RPC call.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] LedgerError),
    /// The node answered with an error result.
    #[error("{method}: {code}: {message}")]
    Remote {
        method: String,
        code: String,
        message: String,
    },
}

impl RpcError {
    pub fn code(&self) -> Option<&str> {
        match self {
            RpcError::Remote { code, .. } => Some(code),
            RpcError::Transport(_) => None,
        }
    }
}

impl From<RpcError> for LedgerError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(err) => err,
            err @ RpcError::Remote { .. } => LedgerError::Rpc(err.to_string()),
        }
    }
}

/// A rippled JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpc {
    http: reqwest::Client,
    url: String,
}

impl JsonRpc {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LedgerError::Connection(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            url: url.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends `method` with a single params object and returns the `result` member.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        debug!("XRPL request {method} to {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "method": method, "params": [params] }))
            .send()
            .await
            .map_err(|err| transport_error(&self.url, err))?;
        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!("{method}: HTTP {}", response.status())).into());
        }
        let body: Value = response
            .json()
            .await
            .map_err(|err| LedgerError::Rpc(format!("{method}: invalid JSON response: {err}")))?;
        into_result(method, body)
    }
}

/// Maps a reqwest failure onto the ledger error taxonomy.
pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout(url.to_owned())
    } else if err.is_connect() {
        LedgerError::Connection(format!("{url}: {err}"))
    } else {
        LedgerError::Rpc(format!("{url}: {err}"))
    }
}

/// Extracts `result` from a response body, surfacing rippled errors.
pub fn into_result(method: &str, mut body: Value) -> Result<Value, RpcError> {
    let result = body
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| LedgerError::Rpc(format!("{method}: response missing result")))?;
    match result.get("error").and_then(Value::as_str) {
        Some(code) => Err(RpcError::Remote {
            method: method.to_owned(),
            code: code.to_owned(),
            message: result
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or(code)
                .to_owned(),
        }),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        let result = into_result(
            "account_info",
            json!({"result": {"status": "success", "account_data": {"Sequence": 3}}}),
        )
        .unwrap();
        assert_eq!(result["account_data"]["Sequence"], 3);

        let err = into_result(
            "account_info",
            json!({"result": {"status": "error", "error": "actNotFound", "error_message": "Account not found."}}),
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ACCOUNT_NOT_FOUND));
        assert_eq!(
            LedgerError::from(err),
            LedgerError::Rpc("account_info: actNotFound: Account not found.".to_string())
        );

        let err = into_result("tx", json!({"status": "ok"})).unwrap_err();
        assert!(err.code().is_none());
    }
}

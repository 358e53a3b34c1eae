//! Seed-based transaction signing through a trusted rippled node.
use crate::rpc::JsonRpc;
use async_trait::async_trait;
use cr3dential_core::ledger::{
    DidSetTransaction, LedgerError, NetworkConfig, SignedTransaction, TransactionSigner,
};
use log::debug;
use serde_json::{json, Value};

/// Environment variable holding the issuer account seed.
pub const CR3DENTIAL_ISSUER_SEED: &str = "CR3DENTIAL_ISSUER_SEED";

fn field<'a>(method: &str, result: &'a Value, name: &str) -> Result<&'a str, LedgerError> {
    result[name]
        .as_str()
        .ok_or_else(|| LedgerError::Signing(format!("{method}: response missing {name}")))
}

/// Signs with a seed held by this process, using the node's `sign` method.
///
/// The seed is sent to the configured node, which must therefore be operated by the issuer.
pub struct RpcSigner {
    rpc: JsonRpc,
    seed: String,
    account: String,
    public_key_hex: String,
}

impl std::fmt::Debug for RpcSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcSigner")
            .field("account", &self.account)
            .field("public_key_hex", &self.public_key_hex)
            .finish_non_exhaustive()
    }
}

impl RpcSigner {
    /// Derives the account and public key of `seed` with `wallet_propose`.
    pub async fn from_seed(network: &NetworkConfig, seed: &str) -> Result<Self, LedgerError> {
        let rpc = JsonRpc::new(&network.rpc_url, network.request_timeout)?;
        let result = rpc
            .request("wallet_propose", json!({ "seed": seed }))
            .await
            .map_err(|err| LedgerError::Signing(err.to_string()))?;
        let account = field("wallet_propose", &result, "account_id")?.to_owned();
        let public_key_hex = field("wallet_propose", &result, "public_key_hex")?.to_owned();
        debug!("Loaded signing key for {account}");
        Ok(Self {
            rpc,
            seed: seed.to_owned(),
            account,
            public_key_hex,
        })
    }

    /// Signer for the seed in `$CR3DENTIAL_ISSUER_SEED`.
    pub async fn from_env(network: &NetworkConfig) -> Result<Self, LedgerError> {
        let seed = std::env::var(CR3DENTIAL_ISSUER_SEED).map_err(|_| {
            LedgerError::Signing(format!("{CR3DENTIAL_ISSUER_SEED} is not set"))
        })?;
        Self::from_seed(network, &seed).await
    }
}

#[async_trait]
impl TransactionSigner for RpcSigner {
    fn account(&self) -> &str {
        &self.account
    }

    fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    async fn sign(&self, tx: &DidSetTransaction) -> Result<SignedTransaction, LedgerError> {
        if tx.account != self.account {
            return Err(LedgerError::Signing(format!(
                "transaction account {} does not match signer {}",
                tx.account, self.account
            )));
        }
        let tx_json = tx
            .to_tx_json()
            .map_err(|err| LedgerError::Signing(err.to_string()))?;
        let result = self
            .rpc
            .request(
                "sign",
                json!({ "tx_json": tx_json, "secret": self.seed, "offline": true }),
            )
            .await
            .map_err(|err| LedgerError::Signing(err.to_string()))?;
        Ok(SignedTransaction {
            tx_blob: field("sign", &result, "tx_blob")?.to_owned(),
            hash: field("sign", &result["tx_json"], "hash")?.to_owned(),
        })
    }
}

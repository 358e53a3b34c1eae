//! Anchoring a pointer URI on the ledger with a DID Set transaction.
//!
//! Each stage is a separate type so an anchor moves `Prepared -> Signed -> Submitted` and
//! finishes as a validated [`AnchorReceipt`] or a rejected [`LedgerError`].
use crate::ledger::{
    DidSetTransaction, LedgerClient, LedgerConnector, LedgerError, NetworkConfig,
    SignedTransaction, TransactionSigner, SUCCESS_RESULT,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_FINALITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounds on waiting for a submitted transaction to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalityConfig {
    /// Wait before the first status query.
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    /// Total wait after the settle delay.
    pub timeout: Duration,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_FINALITY_TIMEOUT,
        }
    }
}

/// A validated anchoring transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorReceipt {
    pub tx_hash: String,
    pub explorer_url: String,
}

/// A DID Set transaction built with the account's current sequence.
#[derive(Debug, Clone)]
pub struct PreparedAnchor {
    tx: DidSetTransaction,
}

impl PreparedAnchor {
    pub async fn prepare(
        client: &dyn LedgerClient,
        account: &str,
        uri: &str,
    ) -> Result<Self, LedgerError> {
        let info = client.account_info(account).await?;
        debug!("Prepared DID Set for {account} at sequence {}", info.sequence);
        Ok(Self {
            tx: DidSetTransaction::new(account, uri, info.sequence),
        })
    }

    pub fn transaction(&self) -> &DidSetTransaction {
        &self.tx
    }

    pub async fn sign(self, signer: &dyn TransactionSigner) -> Result<SignedAnchor, LedgerError> {
        if signer.account() != self.tx.account {
            return Err(LedgerError::Signing(format!(
                "signer account {} cannot sign for {}",
                signer.account(),
                self.tx.account
            )));
        }
        let signed = signer.sign(&self.tx).await?;
        debug!("Signed DID Set {}", signed.hash);
        Ok(SignedAnchor { signed })
    }
}

#[derive(Debug, Clone)]
pub struct SignedAnchor {
    signed: SignedTransaction,
}

impl SignedAnchor {
    pub fn hash(&self) -> &str {
        &self.signed.hash
    }

    /// Submits the transaction. Any engine result other than `tesSUCCESS` is a rejection.
    pub async fn submit(self, client: &dyn LedgerClient) -> Result<SubmittedAnchor, LedgerError> {
        let response = client.submit(&self.signed).await?;
        if !response.is_success() {
            warn!(
                "DID Set {} rejected: {} ({})",
                self.signed.hash, response.engine_result, response.engine_result_message
            );
            return Err(LedgerError::Rejected {
                code: response.engine_result,
                message: response.engine_result_message,
            });
        }
        debug!("Submitted DID Set {}", self.signed.hash);
        Ok(SubmittedAnchor {
            hash: self.signed.hash,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SubmittedAnchor {
    hash: String,
}

impl SubmittedAnchor {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Waits the settle delay, then polls until the transaction validates or the timeout elapses.
    pub async fn wait(
        self,
        client: &dyn LedgerClient,
        finality: &FinalityConfig,
    ) -> Result<AnchorReceipt, LedgerError> {
        sleep(finality.settle_delay).await;
        let deadline = Instant::now() + finality.timeout;
        loop {
            match client.transaction(&self.hash).await {
                Ok(status) if status.validated => {
                    return match status.result.as_deref() {
                        Some(SUCCESS_RESULT) => {
                            info!("DID Set {} validated", self.hash);
                            Ok(AnchorReceipt {
                                explorer_url: client.network_config().explorer_tx_url(&self.hash),
                                tx_hash: self.hash,
                            })
                        }
                        result => Err(LedgerError::Rejected {
                            code: result.unwrap_or("unknown").to_owned(),
                            message: format!("transaction {} failed validation", self.hash),
                        }),
                    };
                }
                Ok(_) | Err(LedgerError::TransactionNotFound(_)) => {}
                Err(err) => return Err(err),
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::NotValidated(self.hash));
            }
            sleep(finality.poll_interval).await;
        }
    }
}

/// Points `account`'s DID record at `uri` and waits for validation.
pub async fn anchor(
    client: &dyn LedgerClient,
    account: &str,
    signer: &dyn TransactionSigner,
    uri: &str,
    finality: &FinalityConfig,
) -> Result<AnchorReceipt, LedgerError> {
    PreparedAnchor::prepare(client, account, uri)
        .await?
        .sign(signer)
        .await?
        .submit(client)
        .await?
        .wait(client, finality)
        .await
}

/// Anchors URIs from a single account, opening a fresh ledger session per anchor.
#[derive(Clone)]
pub struct LedgerAnchor {
    connector: Arc<dyn LedgerConnector>,
    signer: Arc<dyn TransactionSigner>,
    network: NetworkConfig,
    finality: FinalityConfig,
}

impl LedgerAnchor {
    pub fn new(
        connector: Arc<dyn LedgerConnector>,
        signer: Arc<dyn TransactionSigner>,
        network: NetworkConfig,
        finality: FinalityConfig,
    ) -> Self {
        Self {
            connector,
            signer,
            network,
            finality,
        }
    }

    pub fn account(&self) -> &str {
        self.signer.account()
    }

    pub fn public_key_hex(&self) -> &str {
        self.signer.public_key_hex()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Anchors `uri`. The session is disconnected on both success and failure.
    pub async fn anchor_uri(&self, uri: &str) -> Result<AnchorReceipt, LedgerError> {
        let client = self.connector.connect(&self.network).await?;
        let result = anchor(
            client.as_ref(),
            self.signer.account(),
            self.signer.as_ref(),
            uri,
            &self.finality,
        )
        .await;
        if let Err(err) = client.disconnect().await {
            warn!("Ledger disconnect failed: {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HOLDER_ACCOUNT;
    use crate::ledger::{encode_uri, TransactionStatus};
    use crate::memory::{MemoryLedger, MemorySigner};
    use crate::mocks::MockLedgerClient;

    const DOCUMENT_URI: &str = "https://gateway.test/ipfs/QmDocument";

    fn instant_finality() -> FinalityConfig {
        FinalityConfig {
            settle_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_anchor() {
        let ledger = MemoryLedger::default();
        ledger.fund_account(HOLDER_ACCOUNT, 100_000_000);
        let signer = MemorySigner::new(HOLDER_ACCOUNT);
        let receipt = anchor(
            &ledger,
            HOLDER_ACCOUNT,
            &signer,
            DOCUMENT_URI,
            &instant_finality(),
        )
        .await
        .unwrap();
        assert_eq!(
            receipt.explorer_url,
            format!("https://testnet.xrpl.org/transactions/{}", receipt.tx_hash)
        );
        assert_eq!(
            ledger.did_uri(HOLDER_ACCOUNT),
            Some(encode_uri(DOCUMENT_URI))
        );
    }

    #[tokio::test]
    async fn test_stale_sequence_rejected() {
        let ledger = MemoryLedger::default();
        ledger.fund_account(HOLDER_ACCOUNT, 100_000_000);
        let signer = MemorySigner::new(HOLDER_ACCOUNT);
        let first = PreparedAnchor::prepare(&ledger, HOLDER_ACCOUNT, DOCUMENT_URI)
            .await
            .unwrap();
        let second = PreparedAnchor::prepare(&ledger, HOLDER_ACCOUNT, "https://gateway.test/ipfs/QmOther")
            .await
            .unwrap();
        assert_eq!(first.transaction().sequence, second.transaction().sequence);

        first
            .sign(&signer)
            .await
            .unwrap()
            .submit(&ledger)
            .await
            .unwrap();
        let err = second
            .sign(&signer)
            .await
            .unwrap()
            .submit(&ledger)
            .await
            .unwrap_err();
        assert!(err.is_sequence_conflict());
        assert_eq!(
            ledger.did_uri(HOLDER_ACCOUNT),
            Some(encode_uri(DOCUMENT_URI))
        );
    }

    #[tokio::test]
    async fn test_signer_account_mismatch() {
        let ledger = MemoryLedger::default();
        ledger.fund_account(HOLDER_ACCOUNT, 100_000_000);
        let signer = MemorySigner::new("rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe");
        let prepared = PreparedAnchor::prepare(&ledger, HOLDER_ACCOUNT, DOCUMENT_URI)
            .await
            .unwrap();
        assert!(matches!(
            prepared.sign(&signer).await,
            Err(LedgerError::Signing(_))
        ));
    }

    #[tokio::test]
    async fn test_unfunded_account() {
        let ledger = MemoryLedger::default();
        assert_eq!(
            PreparedAnchor::prepare(&ledger, HOLDER_ACCOUNT, DOCUMENT_URI)
                .await
                .unwrap_err(),
            LedgerError::AccountNotFound(HOLDER_ACCOUNT.to_string())
        );
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let mut client = MockLedgerClient::new();
        client.expect_transaction().returning(|hash| {
            Ok(TransactionStatus {
                hash: hash.to_string(),
                validated: false,
                result: None,
            })
        });
        let submitted = SubmittedAnchor {
            hash: "PENDING".to_string(),
        };
        assert_eq!(
            submitted.wait(&client, &instant_finality()).await,
            Err(LedgerError::NotValidated("PENDING".to_string()))
        );
    }

    #[tokio::test]
    async fn test_wait_validated_failure() {
        let mut client = MockLedgerClient::new();
        client.expect_transaction().returning(|hash| {
            Ok(TransactionStatus {
                hash: hash.to_string(),
                validated: true,
                result: Some("tecNO_PERMISSION".to_string()),
            })
        });
        let submitted = SubmittedAnchor {
            hash: "FAILED".to_string(),
        };
        assert!(matches!(
            submitted.wait(&client, &instant_finality()).await,
            Err(LedgerError::Rejected { code, .. }) if code == "tecNO_PERMISSION"
        ));
    }

    #[tokio::test]
    async fn test_ledger_anchor_disconnects() {
        let ledger = MemoryLedger::default();
        ledger.fund_account(HOLDER_ACCOUNT, 100_000_000);
        let service = LedgerAnchor::new(
            Arc::new(ledger.clone()),
            Arc::new(MemorySigner::new(HOLDER_ACCOUNT)),
            NetworkConfig::default(),
            instant_finality(),
        );
        service.anchor_uri(DOCUMENT_URI).await.unwrap();
        // Second anchor with an unfunded signer fails but still disconnects.
        let unfunded = LedgerAnchor::new(
            Arc::new(ledger.clone()),
            Arc::new(MemorySigner::new("rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe")),
            NetworkConfig::default(),
            instant_finality(),
        );
        assert!(unfunded.anchor_uri(DOCUMENT_URI).await.is_err());
        assert_eq!(ledger.connect_count(), 2);
        assert_eq!(ledger.disconnect_count(), 2);
    }
}

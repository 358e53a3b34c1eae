//! Operations behind the `cr3dential-cli` subcommands.
use chrono::Utc;
use cr3dential_core::anchor::{AnchorReceipt, FinalityConfig, LedgerAnchor};
use cr3dential_core::catalog::{CatalogError, CredentialCatalog};
use cr3dential_core::config::CoreConfig;
use cr3dential_core::credential::StoredCredential;
use cr3dential_core::did::{Did, DidError};
use cr3dential_core::issuer::{claim_issuer_did, IssuerDidClaim, IssuerError, IssuerProfile};
use cr3dential_core::ledger::{
    Balance, FundedWallet, LedgerConnector, LedgerError, NetworkConfig, TransactionSigner,
};
use cr3dential_core::local::{LocalStore, LocalStoreError};
use cr3dential_core::offer::{CredentialOffer, OfferBuilder, OfferError};
use cr3dential_core::resolver::{Resolution, Resolver, ResolverError};
use cr3dential_core::store::{ContentStore, StoreError};
use cr3dential_xrpl::config::XrplConfig;
use cr3dential_xrpl::XrplConnector;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// An error relating to a CLI operation.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid DID: {0}")]
    InvalidDid(#[from] DidError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Offer(#[from] OfferError),
    #[error("{0}")]
    Resolver(#[from] ResolverError),
    #[error("{0}")]
    Issuer(#[from] IssuerError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("Local cache error: {0}")]
    Cache(#[from] LocalStoreError),
}

/// Backends and network selection shared by all subcommands.
pub struct Cr3dentialCli {
    connector: Arc<dyn LedgerConnector>,
    store: Arc<dyn ContentStore>,
    local: LocalStore,
    catalog: CredentialCatalog,
    network: NetworkConfig,
    finality: FinalityConfig,
}

impl Cr3dentialCli {
    pub fn new(
        connector: Arc<dyn LedgerConnector>,
        store: Arc<dyn ContentStore>,
        local: LocalStore,
        catalog: CredentialCatalog,
        network: NetworkConfig,
        finality: FinalityConfig,
    ) -> Self {
        Self {
            connector,
            store,
            local,
            catalog,
            network,
            finality,
        }
    }

    /// XRPL backends built from the `[core]` and `[xrpl]` tables.
    pub fn from_config(
        core: &CoreConfig,
        xrpl: &XrplConfig,
        network: NetworkConfig,
    ) -> Result<Self, CliError> {
        let store = xrpl.content_store(Duration::from_millis(core.request_timeout_ms))?;
        Ok(Self::new(
            Arc::new(XrplConnector),
            store,
            LocalStore::from_env()?,
            core.catalog()?,
            network,
            core.finality(),
        ))
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn anchor(&self, signer: Arc<dyn TransactionSigner>) -> LedgerAnchor {
        LedgerAnchor::new(
            self.connector.clone(),
            signer,
            self.network.clone(),
            self.finality,
        )
    }

    pub async fn resolve(&self, did: &str) -> Result<Resolution, CliError> {
        Ok(Resolver::new(self.connector.clone(), self.store.clone())
            .resolve(&self.network, did)
            .await?)
    }

    /// Points the signer's DID record at an already uploaded document.
    pub async fn anchor_document(
        &self,
        signer: Arc<dyn TransactionSigner>,
        uri: &str,
    ) -> Result<AnchorReceipt, CliError> {
        debug!("Anchoring {uri} for {}", signer.account());
        Ok(self.anchor(signer).anchor_uri(uri).await?)
    }

    /// Publishes and anchors an issuer DID document for the signer's account.
    pub async fn claim_did(
        &self,
        signer: Arc<dyn TransactionSigner>,
        profile: &IssuerProfile,
    ) -> Result<IssuerDidClaim, CliError> {
        Ok(claim_issuer_did(self.store.as_ref(), &self.anchor(signer), profile).await?)
    }

    pub fn build_offer(&self, type_key: &str, did: &str) -> Result<CredentialOffer, CliError> {
        let did: Did = did.parse()?;
        Ok(OfferBuilder::new(&self.catalog).build_offer(type_key, &did)?)
    }

    pub async fn balances(&self, account: &str) -> Result<Vec<Balance>, CliError> {
        let client = self.connector.connect(&self.network).await?;
        let result = client.balances(account).await;
        if let Err(err) = client.disconnect().await {
            warn!("Ledger disconnect failed: {err}");
        }
        Ok(result?)
    }

    pub async fn fund_wallet(&self) -> Result<FundedWallet, CliError> {
        let client = self.connector.connect(&self.network).await?;
        let result = client.fund_wallet().await;
        if let Err(err) = client.disconnect().await {
            warn!("Ledger disconnect failed: {err}");
        }
        Ok(result?)
    }

    /// Cached credentials of `did` with their status as of now.
    pub fn credentials(&self, did: &str) -> Result<Vec<StoredCredential>, CliError> {
        let did: Did = did.parse()?;
        let now = Utc::now();
        Ok(self
            .local
            .credentials_for(&did.to_string())?
            .into_iter()
            .map(|mut stored| {
                stored.status = stored.status_at(now);
                stored
            })
            .collect())
    }
}

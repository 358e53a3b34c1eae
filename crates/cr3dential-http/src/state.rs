use crate::config::HTTPConfig;
use crate::errors::Cr3dentialHTTPError;
use cr3dential_core::anchor::LedgerAnchor;
use cr3dential_core::catalog::CredentialCatalog;
use cr3dential_core::claim::ClaimFlow;
use cr3dential_core::config::{core_config, CoreConfig};
use cr3dential_core::directory::IssuerDirectory;
use cr3dential_core::issuer::IssuanceEngine;
use cr3dential_core::ledger::{
    LedgerConnector, LedgerError, Network, NetworkConfig, TransactionSigner,
};
use cr3dential_core::local::LocalStore;
use cr3dential_core::resolver::Resolver;
use cr3dential_core::store::ContentStore;
use cr3dential_xrpl::config::{xrpl_config, XrplConfig};
use cr3dential_xrpl::{RpcSigner, XrplConnector};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// A shared app state for handlers.
pub struct AppState {
    pub config: HTTPConfig,
    pub core: CoreConfig,
    pub xrpl: XrplConfig,
    pub directory: Arc<dyn IssuerDirectory>,
    pub resolver: Resolver,
    pub claims: ClaimFlow,
}

impl AppState {
    /// App state backed by the XRPL network and content store named in configuration.
    pub async fn new(config: HTTPConfig) -> Result<Self, Cr3dentialHTTPError> {
        let core: CoreConfig = (**core_config()).clone();
        let xrpl: XrplConfig = (**xrpl_config()).clone();
        let store = xrpl.content_store(Duration::from_millis(core.request_timeout_ms))?;
        let connector: Arc<dyn LedgerConnector> = Arc::new(XrplConnector);
        let network = xrpl.network_config(core.network_config());
        let anchor = if core.anchor_credentials {
            let signer = RpcSigner::from_env(&network).await?;
            if let Some(expected) = &xrpl.issuer_account {
                if expected != signer.account() {
                    return Err(LedgerError::Signing(format!(
                        "issuer seed does not belong to {expected}"
                    ))
                    .into());
                }
            }
            Some(LedgerAnchor::new(
                connector.clone(),
                Arc::new(signer),
                network,
                core.finality(),
            ))
        } else {
            None
        };
        let local = LocalStore::from_env()?;
        Self::new_with_backends(config, core, xrpl, connector, store, local, anchor)
    }

    /// App state over explicit ledger, store and cache backends.
    pub fn new_with_backends(
        config: HTTPConfig,
        core: CoreConfig,
        xrpl: XrplConfig,
        connector: Arc<dyn LedgerConnector>,
        store: Arc<dyn ContentStore>,
        local: LocalStore,
        anchor: Option<LedgerAnchor>,
    ) -> Result<Self, Cr3dentialHTTPError> {
        let catalog = Arc::new(core.catalog()?);
        let directory: Arc<dyn IssuerDirectory> = Arc::new(core.directory()?);
        let mut engine = IssuanceEngine::new(catalog, directory.clone(), store.clone());
        if let Some(anchor) = anchor {
            info!("Anchoring credentials from {}", anchor.account());
            engine = engine.with_anchor(anchor);
        }
        let resolver = Resolver::new(connector, store);
        let claims = ClaimFlow::new(engine, resolver.clone(), Arc::new(local));
        Ok(Self {
            config,
            core,
            xrpl,
            directory,
            resolver,
            claims,
        })
    }

    pub fn catalog(&self) -> &CredentialCatalog {
        self.claims.engine().catalog()
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        self.claims.engine().store()
    }

    pub fn local(&self) -> &Arc<LocalStore> {
        self.claims.local()
    }

    /// Network settings for a request, the configured network if none is named.
    pub fn network_config(&self, network: Option<Network>) -> NetworkConfig {
        match network {
            Some(network) if network != self.core.network => self.core.network_config_for(network),
            _ => self.xrpl.network_config(self.core.network_config()),
        }
    }
}

//! Mock collaborators for failure injection in tests.
use crate::directory::{DirectoryError, IssuerDirectory, IssuerMetadata};
use crate::ledger::{
    AccountInfo, Balance, FundedWallet, LedgerClient, LedgerError, LedgerObject, NetworkConfig,
    SignedTransaction, SubmitResponse, TransactionStatus,
};
use crate::store::{ContentStore, StoreError};
use async_trait::async_trait;
use mockall::mock;

mock! {
    pub LedgerClient {}
    #[async_trait]
    impl LedgerClient for LedgerClient {
        fn network_config(&self) -> &NetworkConfig;
        async fn account_objects(
            &self,
            account: &str,
            object_type: &str,
        ) -> Result<Vec<LedgerObject>, LedgerError>;
        async fn account_info(&self, account: &str) -> Result<AccountInfo, LedgerError>;
        async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError>;
        async fn transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError>;
        async fn balances(&self, account: &str) -> Result<Vec<Balance>, LedgerError>;
        async fn fund_wallet(&self) -> Result<FundedWallet, LedgerError>;
        async fn disconnect(&self) -> Result<(), LedgerError>;
    }
}

mock! {
    pub ContentStore {}
    #[async_trait]
    impl ContentStore for ContentStore {
        async fn upload(&self, payload: Vec<u8>, name: &str) -> Result<String, StoreError>;
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>, StoreError>;
        fn retrieval_uri(&self, content_id: &str) -> String;
    }
}

mock! {
    pub IssuerDirectory {}
    #[async_trait]
    impl IssuerDirectory for IssuerDirectory {
        async fn list_issuers(&self) -> Result<Vec<IssuerMetadata>, DirectoryError>;
    }
}

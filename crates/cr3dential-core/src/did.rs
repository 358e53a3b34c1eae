//! Decentralized identifiers rooted in ledger accounts.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// DID method used when formatting a DID for a ledger account.
pub const DID_METHOD: &str = "xrpl";

/// Network identifier used when formatting a DID for a ledger account.
pub const DID_NETWORK_ID: &str = "1";

const DID_SCHEME: &str = "did";
const DID_DELIMITER: char = ':';

/// Base58 alphabet of classic ledger addresses.
pub(crate) const ACCOUNT_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";
const ACCOUNT_MIN_LEN: usize = 25;
const ACCOUNT_MAX_LEN: usize = 35;

/// An error relating to DID parsing.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum DidError {
    /// No `:` separated account segment.
    #[error("DID: {0} has no account segment.")]
    MissingAccount(String),
    /// Scheme is not `did`.
    #[error("DID: {0} does not use the 'did' scheme.")]
    InvalidScheme(String),
    /// Method segment is missing or empty.
    #[error("DID: {0} has no method.")]
    MissingMethod(String),
    /// Account segment is not a classic ledger address.
    #[error("Invalid ledger account: {0}")]
    InvalidAccount(String),
}

/// A DID of the form `did:<method>:<network-id>:<account>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    network: Option<String>,
    account: String,
}

impl Did {
    /// Formats the DID of a ledger account, e.g. `did:xrpl:1:<account>`.
    pub fn for_account(account: &str) -> Result<Self, DidError> {
        if !is_valid_account(account) {
            return Err(DidError::InvalidAccount(account.to_string()));
        }
        Ok(Self {
            method: DID_METHOD.to_string(),
            network: Some(DID_NETWORK_ID.to_string()),
            account: account.to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// The ledger account this DID maps to.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Verification method id `<did>#<fragment>`.
    pub fn key_id(&self, fragment: &str) -> String {
        format!("{self}#{fragment}")
    }

    /// Verification method id used for credential proofs.
    pub fn default_key_id(&self) -> String {
        self.key_id(crate::DEFAULT_KEY_FRAGMENT)
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(did: &str) -> Result<Self, Self::Err> {
        let (prefix, account) = did
            .rsplit_once(DID_DELIMITER)
            .ok_or_else(|| DidError::MissingAccount(did.to_string()))?;
        let mut segments = prefix.splitn(3, DID_DELIMITER);
        if segments.next() != Some(DID_SCHEME) {
            return Err(DidError::InvalidScheme(did.to_string()));
        }
        let method = segments
            .next()
            .filter(|method| !method.is_empty())
            .ok_or_else(|| DidError::MissingMethod(did.to_string()))?;
        let network = segments
            .next()
            .filter(|network| !network.is_empty())
            .map(str::to_string);
        if !is_valid_account(account) {
            return Err(DidError::InvalidAccount(account.to_string()));
        }
        Ok(Self {
            method: method.to_string(),
            network,
            account: account.to_string(),
        })
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(did: String) -> Result<Self, Self::Error> {
        did.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DID_SCHEME}:{}", self.method)?;
        if let Some(network) = &self.network {
            write!(f, ":{network}")?;
        }
        write!(f, ":{}", self.account)
    }
}

/// Checks the shape of a classic ledger address (leading `r`, base58 alphabet, length).
pub fn is_valid_account(account: &str) -> bool {
    account.starts_with('r')
        && (ACCOUNT_MIN_LEN..=ACCOUNT_MAX_LEN).contains(&account.len())
        && account.chars().all(|c| ACCOUNT_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HOLDER_ACCOUNT, HOLDER_DID};

    #[test]
    fn test_parse() {
        let did: Did = HOLDER_DID.parse().unwrap();
        assert_eq!(did.method(), "xrpl");
        assert_eq!(did.network(), Some("1"));
        assert_eq!(did.account(), HOLDER_ACCOUNT);
        assert_eq!(did.to_string(), HOLDER_DID);
        assert_eq!(did.default_key_id(), format!("{HOLDER_DID}#keys-1"));

        let did: Did = format!("did:xrp:{HOLDER_ACCOUNT}").parse().unwrap();
        assert_eq!(did.method(), "xrp");
        assert_eq!(did.network(), None);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            "not-a-did".parse::<Did>(),
            Err(DidError::MissingAccount("not-a-did".to_string()))
        );
        assert!(matches!(
            format!("urn:xrpl:1:{HOLDER_ACCOUNT}").parse::<Did>(),
            Err(DidError::InvalidScheme(_))
        ));
        assert!(matches!(
            format!("did::{HOLDER_ACCOUNT}").parse::<Did>(),
            Err(DidError::MissingMethod(_))
        ));
        assert!(matches!(
            "did:xrpl:1:0xdeadbeef".parse::<Did>(),
            Err(DidError::InvalidAccount(_))
        ));
    }

    #[test]
    fn test_for_account() {
        let did = Did::for_account(HOLDER_ACCOUNT).unwrap();
        assert_eq!(did.to_string(), HOLDER_DID);
        assert!(Did::for_account("rShort").is_err());
    }

    #[test]
    fn test_serde() {
        let did: Did = serde_json::from_str(&format!("\"{HOLDER_DID}\"")).unwrap();
        assert_eq!(serde_json::to_string(&did).unwrap(), format!("\"{HOLDER_DID}\""));
        assert!(serde_json::from_str::<Did>("\"did:xrpl\"").is_err());
    }
}

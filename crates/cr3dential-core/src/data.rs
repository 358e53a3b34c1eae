//! Test fixtures.

pub(crate) const HOLDER_ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
pub(crate) const HOLDER_DID: &str = "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

pub(crate) const ISSUER_42_ACCOUNT: &str = "rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe";
pub(crate) const ISSUER_42_DID: &str = "did:xrpl:1:rEn1LyQuaMaqbz8kBkamQeXjHqX1t7kVNe";

pub(crate) const TEST_GATEWAY: &str = "https://gateway.test/ipfs";

pub(crate) const TEST_DID_DOCUMENT: &str = r#"{
    "@context": ["https://www.w3.org/ns/did/v1"],
    "id": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
    "controller": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
    "alsoKnownAs": ["https://example.org/holder"],
    "verificationMethod": [
        {
            "id": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh#keys-1",
            "type": "EcdsaSecp256k1VerificationKey2019",
            "controller": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
            "publicKeyMultibase": "zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme"
        }
    ],
    "authentication": ["did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh#keys-1"],
    "assertionMethod": ["did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh#keys-1"],
    "service": [
        {
            "id": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh#profile",
            "type": "Public Profile",
            "serviceEndpoint": "https://gateway.test/ipfs/QmProfile"
        }
    ],
    "credentialSubject": {
        "did": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
        "credentials": ["https://gateway.test/ipfs/QmEarlierCredential"]
    }
}"#;

//! Test fixtures.

pub(crate) const HOLDER_DID: &str = "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

pub(crate) const TEST_GATEWAY: &str = "https://gateway.test/ipfs";

pub(crate) const TEST_DID_DOCUMENT: &str = r#"{
    "@context": ["https://www.w3.org/ns/did/v1"],
    "id": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
    "controller": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
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
    "credentialSubject": {
        "did": "did:xrpl:1:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
        "credentials": []
    }
}"#;

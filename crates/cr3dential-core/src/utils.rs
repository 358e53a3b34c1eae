//! Utils module.
use serde::Serialize;
use sha2::{Digest, Sha256};

/// [`JSON_CANONICALIZATION_SCHEME`](https://www.rfc-editor.org/rfc/rfc8785)
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_jcs::to_string(value)
}

/// Canonicalizes a JSON string.
pub fn canonicalize_str<T: Serialize + for<'a> serde::Deserialize<'a>>(
    value: &str,
) -> Result<String, serde_json::Error> {
    canonicalize(&serde_json::from_str::<T>(value)?)
}

/// Lower-case hex SHA-256 digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DidDocument;
    use serde_json::json;

    #[test]
    fn test_canonicalize() {
        let value = json!({"b": 1, "a": {"d": [2, 1], "c": null}});
        assert_eq!(
            canonicalize(&value).unwrap(),
            r#"{"a":{"c":null,"d":[2,1]},"b":1}"#
        );
    }

    #[test]
    fn test_canonicalize_str() {
        let pretty = crate::data::TEST_DID_DOCUMENT;
        let compact = serde_json::to_string(
            &serde_json::from_str::<serde_json::Value>(pretty).unwrap(),
        )
        .unwrap();
        assert_eq!(
            canonicalize_str::<DidDocument>(pretty).unwrap(),
            canonicalize_str::<DidDocument>(&compact).unwrap()
        );
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

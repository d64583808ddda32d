//! Stable content fingerprints for caching and cross-consultation comparison.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of raw bytes.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Hex-encoded SHA-256 of a value's canonical JSON form.
///
/// Struct fields serialize in declaration order, so equal values always
/// produce equal fingerprints.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(value)?;
    Ok(hash_data(payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_data_known_vector() {
        assert_eq!(
            hash_data(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint(&vec![1, 2, 3]).unwrap();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, hash_data(b"[1,2,3]"));
    }
}

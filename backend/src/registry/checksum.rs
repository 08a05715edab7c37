//! Checksum calculation for model artifacts.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a model artifact.
///
/// # Arguments
/// * `content` - Raw bytes of the artifact file
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let content = br#"{"order": [1, 0, 0]}"#;
        let checksum = calculate_checksum(content);
        assert_eq!(checksum, calculate_checksum(content));
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_artifacts_different_checksum() {
        assert_ne!(calculate_checksum(b"model_a"), calculate_checksum(b"model_b"));
    }
}

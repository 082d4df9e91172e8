use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Short, log-safe fingerprint of an identity token.
///
/// Returns the first 12 hex characters of the SHA-256 digest so nullifiers and
/// KYC hashes never appear verbatim in logs.
pub fn fingerprint(value: &str) -> String {
    let digest = hex::encode(sha256(value.as_bytes()));
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let input = b"hello world";
        let hash = sha256(input);
        assert_eq!(hash.len(), 32);

        // Verify deterministic
        let hash2 = sha256(input);
        assert_eq!(hash, hash2);
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let fp = fingerprint("1234567890123456789");
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, fingerprint("1234567890123456789"));
        assert_ne!(fp, fingerprint("1234567890123456780"));
    }
}

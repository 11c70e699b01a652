use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Lowercase hex encoding of the SHA256 digest (64 characters)
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(sha256(input))
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
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hex_length() {
        assert_eq!(sha256_hex(b"").len(), 64);
    }
}

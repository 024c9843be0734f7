//! SHA3-512 hashing.
//!
//! Used to derive a participant's fingerprint from their DSA public key.
//! Unlike [`crate::blake3`], this is not domain-separated: the fingerprint
//! derivation is a single fixed application, `Sha3-512(dsa_public_key)`.

use sha3::{Digest, Sha3_512};

/// Output size of SHA3-512 in bytes.
pub const HASH_SIZE: usize = 64;

/// Compute the SHA3-512 digest of `data`.
pub fn hash512(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha3_512::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_size() {
        let h = hash512(b"hello");
        assert_eq!(h.len(), HASH_SIZE);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash512(b"ochra"), hash512(b"ochra"));
    }

    #[test]
    fn test_distinct_inputs() {
        assert_ne!(hash512(b"alice"), hash512(b"bob"));
    }

    #[test]
    fn test_empty_input() {
        let h = hash512(b"");
        assert_eq!(h.len(), HASH_SIZE);
    }
}

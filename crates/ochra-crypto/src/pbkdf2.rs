//! PBKDF2-HMAC-SHA256 key derivation for at-rest identity key file encryption.
//!
//! The vault's on-disk key file header (`magic || version || salt || nonce
//! || tag || ciphertext`) is a fixed interop format; this derivation must
//! match it bit-for-bit, so it is implemented directly rather than reusing
//! [`crate::argon2id`], which serves a different at-rest format elsewhere
//! in the workspace.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::Result;

/// Iteration count fixed by the vault key file format.
pub const ITERATIONS: u32 = 600_000;

/// Salt size in bytes.
pub const SALT_SIZE: usize = 32;

/// Derived key size in bytes (AES-256/ChaCha20 key length).
pub const OUTPUT_LEN: usize = 32;

/// Generate a random salt for a new key file.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte key from `password` and `salt` using PBKDF2-HMAC-SHA256
/// at [`ITERATIONS`] rounds.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_SIZE]) -> Result<[u8; OUTPUT_LEN]> {
    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, ITERATIONS, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let salt = [0x11u8; SALT_SIZE];
        let k1 = derive_key(b"correct horse", &salt).expect("derive");
        let k2 = derive_key(b"correct horse", &salt).expect("derive");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_different_passwords_differ() {
        let salt = [0x22u8; SALT_SIZE];
        let k1 = derive_key(b"password one", &salt).expect("derive");
        let k2 = derive_key(b"password two", &salt).expect("derive");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_different_salts_differ() {
        let k1 = derive_key(b"same password", &[0x01u8; SALT_SIZE]).expect("derive");
        let k2 = derive_key(b"same password", &[0x02u8; SALT_SIZE]).expect("derive");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_salt_is_random() {
        let s1 = generate_salt();
        let s2 = generate_salt();
        assert_ne!(s1, s2);
    }
}

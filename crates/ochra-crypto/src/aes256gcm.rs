//! AES-256-GCM AEAD encryption (NIST SP 800-38D).
//!
//! Used for message body encryption in the mailbox protocol, where the
//! shared key comes from a KEM encapsulation rather than a Diffie-Hellman
//! agreement. [`crate::chacha20`] remains the AEAD of choice everywhere
//! else in this crate; this module exists because the wire format this
//! one caller must interoperate with is fixed to AES-256-GCM.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};

use crate::{CryptoError, Result};

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for AES-256-GCM (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt data with AES-256-GCM.
///
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce (must never be reused with the same key)
/// * `plaintext` - data to encrypt
/// * `aad` - additional authenticated data
///
/// Returns ciphertext with the 16-byte authentication tag appended.
pub fn encrypt(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce);

    cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Decrypt data with AES-256-GCM.
pub fn decrypt(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::AeadDecryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let ct = encrypt(&key, &nonce, b"hello messenger", b"aad").expect("encrypt");
        let pt = decrypt(&key, &nonce, &ct, b"aad").expect("decrypt");
        assert_eq!(pt, b"hello messenger");
    }

    #[test]
    fn test_tamper_detected() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let mut ct = encrypt(&key, &nonce, b"hello", b"").expect("encrypt");
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;
        assert!(decrypt(&key, &nonce, &ct, b"").is_err());
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = [0x01u8; KEY_SIZE];
        let nonce = [0x02u8; NONCE_SIZE];
        let ct = encrypt(&key, &nonce, b"payload", b"real-aad").expect("encrypt");
        assert!(decrypt(&key, &nonce, &ct, b"wrong-aad").is_err());
    }
}

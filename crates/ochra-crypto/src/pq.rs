//! Post-quantum KEM and signature facade.
//!
//! Wraps `pqcrypto-mlkem` (ML-KEM-1024, FIPS 203) for key encapsulation and
//! `pqcrypto-mldsa` (ML-DSA-87, FIPS 204) for signatures, at the highest
//! parameter sets each crate offers. No algorithm negotiation: callers get
//! exactly these two primitives, mirroring the fixed-suite policy the rest
//! of this crate already follows for classical curves.

use pqcrypto_mldsa::mldsa87;
use pqcrypto_mlkem::mlkem1024;
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};
use pqcrypto_traits::sign::{
    DetachedSignature as _, PublicKey as _PubKeySign, SecretKey as _SecKeySign,
};

use crate::{CryptoError, Result};

/// ML-KEM-1024 public key size in bytes.
pub const KEM_PUBLIC_KEY_BYTES: usize = mlkem1024::public_key_bytes();
/// ML-KEM-1024 secret key size in bytes.
pub const KEM_SECRET_KEY_BYTES: usize = mlkem1024::secret_key_bytes();
/// ML-KEM-1024 ciphertext size in bytes.
pub const KEM_CIPHERTEXT_BYTES: usize = mlkem1024::ciphertext_bytes();
/// ML-KEM-1024 shared secret size in bytes.
pub const KEM_SHARED_SECRET_BYTES: usize = mlkem1024::shared_secret_bytes();

/// ML-DSA-87 public key size in bytes.
pub const DSA_PUBLIC_KEY_BYTES: usize = mldsa87::public_key_bytes();
/// ML-DSA-87 secret key size in bytes.
pub const DSA_SECRET_KEY_BYTES: usize = mldsa87::secret_key_bytes();

/// An ML-KEM-1024 key pair.
pub struct KemKeyPair {
    pub public_key: Vec<u8>,
    secret_key: mlkem1024::SecretKey,
}

impl KemKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let (pk, sk) = mlkem1024::keypair();
        Self {
            public_key: pk.as_bytes().to_vec(),
            secret_key: sk,
        }
    }

    pub fn secret_key_bytes(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let sk = mlkem1024::SecretKey::from_bytes(bytes)
            .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-KEM secret key: {e}")))?;
        let pk = mlkem1024::public_key_from_secret_key(&sk);
        Ok(Self {
            public_key: pk.as_bytes().to_vec(),
            secret_key: sk,
        })
    }
}

/// Encapsulate a shared secret to `recipient_public_key`.
///
/// Returns `(shared_secret, ciphertext)`; `ciphertext` is sent to the
/// recipient, `shared_secret` is used locally to key an AEAD.
pub fn encapsulate(recipient_public_key: &[u8]) -> Result<([u8; KEM_SHARED_SECRET_BYTES], Vec<u8>)> {
    let pk = mlkem1024::PublicKey::from_bytes(recipient_public_key)
        .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-KEM public key: {e}")))?;
    let (shared_secret, ciphertext) = mlkem1024::encapsulate(&pk);
    let mut out = [0u8; KEM_SHARED_SECRET_BYTES];
    out.copy_from_slice(shared_secret.as_bytes());
    Ok((out, ciphertext.as_bytes().to_vec()))
}

/// Decapsulate `ciphertext` using this key pair's secret key.
pub fn decapsulate(keypair: &KemKeyPair, ciphertext: &[u8]) -> Result<[u8; KEM_SHARED_SECRET_BYTES]> {
    let ct = mlkem1024::Ciphertext::from_bytes(ciphertext)
        .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-KEM ciphertext: {e}")))?;
    let shared_secret = mlkem1024::decapsulate(&ct, &keypair.secret_key);
    let mut out = [0u8; KEM_SHARED_SECRET_BYTES];
    out.copy_from_slice(shared_secret.as_bytes());
    Ok(out)
}

/// An ML-DSA-87 key pair.
pub struct DsaKeyPair {
    pub public_key: Vec<u8>,
    secret_key: mldsa87::SecretKey,
}

impl DsaKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let (pk, sk) = mldsa87::keypair();
        Self {
            public_key: pk.as_bytes().to_vec(),
            secret_key: sk,
        }
    }

    pub fn secret_key_bytes(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    pub fn from_secret_bytes(public_key: &[u8], secret_key: &[u8]) -> Result<Self> {
        let sk = mldsa87::SecretKey::from_bytes(secret_key)
            .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-DSA secret key: {e}")))?;
        Ok(Self {
            public_key: public_key.to_vec(),
            secret_key: sk,
        })
    }

    /// Sign `message`, returning a detached signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        mldsa87::detached_sign(message, &self.secret_key)
            .as_bytes()
            .to_vec()
    }
}

/// Verify a detached ML-DSA-87 signature.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let pk = mldsa87::PublicKey::from_bytes(public_key)
        .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-DSA public key: {e}")))?;
    let sig = mldsa87::DetachedSignature::from_bytes(signature)
        .map_err(|e| CryptoError::PostQuantum(format!("invalid ML-DSA signature: {e}")))?;
    mldsa87::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| CryptoError::SignatureVerification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kem_roundtrip() {
        let kp = KemKeyPair::generate();
        let (ss1, ct) = encapsulate(&kp.public_key).expect("encapsulate");
        let ss2 = decapsulate(&kp, &ct).expect("decapsulate");
        assert_eq!(ss1, ss2);
    }

    #[test]
    fn test_kem_wrong_keypair_fails() {
        let kp1 = KemKeyPair::generate();
        let kp2 = KemKeyPair::generate();
        let (ss1, ct) = encapsulate(&kp1.public_key).expect("encapsulate");
        let ss2 = decapsulate(&kp2, &ct).expect("decapsulate");
        assert_ne!(ss1, ss2);
    }

    #[test]
    fn test_dsa_sign_verify() {
        let kp = DsaKeyPair::generate();
        let sig = kp.sign(b"hello post-quantum world");
        assert!(verify(&kp.public_key, b"hello post-quantum world", &sig).is_ok());
    }

    #[test]
    fn test_dsa_tampered_message_fails() {
        let kp = DsaKeyPair::generate();
        let sig = kp.sign(b"original message");
        assert!(verify(&kp.public_key, b"tampered message", &sig).is_err());
    }
}

//! Participant fingerprint: `Sha3-512(dsa_public_key)`, 64 bytes / 128 hex chars.

use std::fmt;

use crate::{EngineError, Result};

/// Canonical hex length of a fingerprint. The source this protocol was
/// distilled from also carries a 132-char variant of the validation helper;
/// 128 is treated as canonical here (see DESIGN.md).
pub const FINGERPRINT_HEX_LEN: usize = 128;

/// A participant's identity fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint(#[serde(with = "hex_bytes")] pub [u8; 64]);

impl Fingerprint {
    /// Derive a fingerprint from a raw ML-DSA-87 public key.
    pub fn from_dsa_public_key(dsa_public_key: &[u8]) -> Self {
        Fingerprint(ochra_crypto::sha3::hash512(dsa_public_key))
    }

    /// Parse a fingerprint from its 128-hex-char canonical string form.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != FINGERPRINT_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EngineError::InvalidArg(format!(
                "fingerprint must be {FINGERPRINT_HEX_LEN} hex chars, got {}",
                s.len()
            )));
        }
        let bytes = hex::decode(s).map_err(|e| EngineError::InvalidArg(e.to_string()))?;
        let mut out = [0u8; 64];
        out.copy_from_slice(&bytes);
        Ok(Fingerprint(out))
    }

    /// Whether `s` is syntactically a valid fingerprint (128 lowercase/any-case hex).
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<[u8; 64], D::Error> {
        let s = String::deserialize(d)?;
        let v = hex::decode(&s).map_err(serde::de::Error::custom)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("fingerprint must decode to 64 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let pk = vec![0x42u8; 2592]; // ML-DSA-87 public key size, arbitrary content
        let fp1 = Fingerprint::from_dsa_public_key(&pk);
        let fp2 = Fingerprint::from_dsa_public_key(&pk);
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint::from_dsa_public_key(b"some key material");
        let hex = fp.to_hex();
        assert_eq!(hex.len(), FINGERPRINT_HEX_LEN);
        let parsed = Fingerprint::parse(&hex).expect("parse");
        assert_eq!(fp, parsed);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!Fingerprint::is_valid("abcd"));
        let too_long = "a".repeat(132);
        assert!(!Fingerprint::is_valid(&too_long));
    }

    #[test]
    fn test_rejects_non_hex() {
        let bad = "z".repeat(FINGERPRINT_HEX_LEN);
        assert!(!Fingerprint::is_valid(&bad));
    }
}

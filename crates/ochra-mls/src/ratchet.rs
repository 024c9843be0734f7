//! Double Ratchet for group key derivation.
//!
//! Implements a symmetric ratchet based on BLAKE3 KDF for deriving
//! per-message keys within an MLS epoch. This provides forward secrecy
//! at the message level within a single epoch.
//!
//! ## KDF Chain
//!
//! Each ratchet step derives two keys from the current chain key:
//! - A **message key** used to encrypt a single message.
//! - A **new chain key** for the next ratchet step.
//!
//! The context string `"Ochra v1 double-ratchet-chain"` is used as the
//! KDF domain separator (mapped to `RATCHET_CHAIN_KEY`).

use ochra_crypto::blake3;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A message key derived from the ratchet chain.
#[derive(Clone, Debug)]
pub struct MessageKey {
    /// The 32-byte encryption key.
    pub key: [u8; 32],
    /// A 12-byte nonce derived alongside the key.
    pub nonce: [u8; 12],
    /// The ratchet step that produced this key.
    pub step: u64,
}

/// State of the symmetric ratchet.
///
/// Tracks the current chain key and ratchet step for deriving
/// per-message encryption keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatchetState {
    /// The current chain key (32 bytes).
    chain_key: [u8; 32],
    /// Current ratchet step (number of advances).
    step: u64,
}

impl RatchetState {
    /// Initialize a new ratchet from a root secret.
    ///
    /// The root secret is typically the epoch secret from the MLS group
    /// key schedule.
    ///
    /// # Arguments
    ///
    /// * `root_secret` - The 32-byte root secret to initialize the chain.
    pub fn new(root_secret: [u8; 32]) -> Self {
        let chain_key = blake3::derive_key(blake3::contexts::RATCHET_CHAIN_KEY, &root_secret);
        Self { chain_key, step: 0 }
    }

    /// Derive the message key for the current step without advancing.
    ///
    /// # Returns
    ///
    /// A [`MessageKey`] for encrypting a single message at the current step.
    pub fn derive_message_key(&self) -> MessageKey {
        let step_bytes = self.step.to_le_bytes();
        let input = blake3::encode_multi_field(&[&self.chain_key, &step_bytes]);

        let key = blake3::derive_key(blake3::contexts::RATCHET_MSG_KEY, &input);

        let nonce_full = blake3::derive_key(blake3::contexts::RATCHET_NONCE, &input);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&nonce_full[..12]);

        MessageKey {
            key,
            nonce,
            step: self.step,
        }
    }

    /// Advance the ratchet to the next step.
    ///
    /// Consumes the current chain key and derives a new one. The old
    /// chain key is overwritten, providing forward secrecy.
    ///
    /// # Returns
    ///
    /// A new [`RatchetState`] at the next step.
    pub fn advance(&self) -> Result<RatchetState> {
        let step_bytes = self.step.to_le_bytes();
        let input = blake3::encode_multi_field(&[&self.chain_key, &step_bytes]);
        let new_chain_key = blake3::derive_key(blake3::contexts::RATCHET_CHAIN_KEY, &input);

        Ok(RatchetState {
            chain_key: new_chain_key,
            step: self.step + 1,
        })
    }

    /// Derive the message key and advance the ratchet in one step.
    ///
    /// This is a convenience method combining [`derive_message_key`] and
    /// [`advance`].
    pub fn derive_and_advance(&mut self) -> Result<MessageKey> {
        let msg_key = self.derive_message_key();
        let next = self.advance()?;
        self.chain_key = next.chain_key;
        self.step = next.step;
        Ok(msg_key)
    }

    /// Get the current ratchet step.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Get the current chain key (for diagnostics; do not expose in production).
    pub fn chain_key(&self) -> &[u8; 32] {
        &self.chain_key
    }
}

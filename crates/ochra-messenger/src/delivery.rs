//! Per-contact delivery watermark tracking (Section 4.8 / C8).
//!
//! A watermark is a self-describing, DSA-signed record a recipient
//! publishes at `watermark:<sender_fp>:<recipient_fp>` to confirm bulk
//! receipt: "I have seen every message from `sender_fp` up to `seq_num`".
//! [`DeliveryTracker`] is the sender-side counterpart: one listener per
//! contact, each driving its own background task that folds incoming
//! watermarks into a monotonic maximum, bulk-marks local messages
//! `Delivered`, and emits [`crate::events::MessengerEvent::MessageDelivered`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use ochra_crypto::pq::DsaKeyPair;

use crate::dht::{DhtClient, PutOutcome};
use crate::events::{EventBus, MessengerEvent};
use crate::fingerprint::Fingerprint;
use crate::keyserver::RECORD_TTL;
use crate::store::MessageStore;
use crate::{EngineError, Result};

fn watermark_key(sender_fp: &Fingerprint, recipient_fp: &Fingerprint) -> String {
    format!("watermark:{sender_fp}:{recipient_fp}")
}

/// A recipient's signed confirmation of bulk receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watermark {
    pub sender_fp: Fingerprint,
    pub recipient_fp: Fingerprint,
    pub seq_num: u64,
    pub timestamp: u64,
    pub dsa_pubkey: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct WatermarkFields<'a> {
    sender_fp: &'a Fingerprint,
    recipient_fp: &'a Fingerprint,
    seq_num: u64,
    timestamp: u64,
    dsa_pubkey: &'a [u8],
}

impl Watermark {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = WatermarkFields {
            sender_fp: &self.sender_fp,
            recipient_fp: &self.recipient_fp,
            seq_num: self.seq_num,
            timestamp: self.timestamp,
            dsa_pubkey: &self.dsa_pubkey,
        };
        serde_json::to_vec(&fields).expect("watermark fields are always serializable")
    }

    pub fn sign(&mut self, dsa: &DsaKeyPair, timestamp: u64) {
        self.timestamp = timestamp;
        self.signature = dsa.sign(&self.canonical_bytes());
    }

    pub fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }
}

/// Publish a watermark for messages received from `sender_fp`, confirming
/// receipt of everything up to `seq_num`. Called by the recipient after
/// processing inbound mailbox entries.
pub async fn publish_watermark(
    dht: &DhtClient,
    sender_fp: Fingerprint,
    recipient_fp: Fingerprint,
    seq_num: u64,
    dsa: &DsaKeyPair,
    now: u64,
) -> Result<()> {
    let mut watermark = Watermark {
        sender_fp,
        recipient_fp,
        seq_num,
        timestamp: now,
        dsa_pubkey: dsa.public_key.clone(),
        signature: Vec::new(),
    };
    watermark.sign(dsa, now);
    let blob = serde_json::to_vec(&watermark).map_err(|e| EngineError::Internal(e.to_string()))?;
    let outcome = dht
        .put_signed(watermark_key(&sender_fp, &recipient_fp).as_bytes(), blob, &dsa.public_key, RECORD_TTL)
        .await;
    match outcome {
        PutOutcome::Ok => Ok(()),
        PutOutcome::TemporaryUnavailable => Err(EngineError::Network),
        PutOutcome::PermanentConflict => Err(EngineError::Internal("unexpected conflict on watermark key".into())),
    }
}

struct TrackedContact {
    token: u64,
    last_known_watermark: Arc<AtomicU64>,
    task: tokio::task::JoinHandle<()>,
}

/// Sender-side per-contact watermark listener registry (C8).
pub struct DeliveryTracker {
    self_fp: Fingerprint,
    contacts: Mutex<HashMap<Fingerprint, TrackedContact>>,
}

impl DeliveryTracker {
    pub fn new(self_fp: Fingerprint) -> Self {
        Self {
            self_fp,
            contacts: Mutex::new(HashMap::new()),
        }
    }

    /// Start tracking delivery confirmations from `recipient_fp`. Idempotent.
    pub async fn track(
        &self,
        dht: Arc<DhtClient>,
        recipient_fp: Fingerprint,
        messages: Arc<MessageStore>,
        events: Arc<EventBus>,
    ) {
        let mut contacts = self.contacts.lock().await;
        if contacts.contains_key(&recipient_fp) {
            return;
        }
        let self_fp = self.self_fp;
        let key = watermark_key(&self_fp, &recipient_fp).into_bytes();
        let (token, mut rx, notify) = dht.listen(&key).await;
        let last_known_watermark = Arc::new(AtomicU64::new(0));
        let watermark_slot = last_known_watermark.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = notify.notified() => break,
                    notification = rx.recv() => {
                        let Ok(notification) = notification else { break };
                        let Ok(watermark) = serde_json::from_slice::<Watermark>(&notification.value) else { continue };
                        if watermark.verify().is_err() {
                            continue;
                        }
                        if watermark.sender_fp != self_fp || watermark.recipient_fp != recipient_fp {
                            continue;
                        }
                        let seq = watermark.seq_num;
                        let prior = watermark_slot.fetch_max(seq, Ordering::SeqCst);
                        let new_high = seq.max(prior);
                        let recipient_hex = recipient_fp.to_hex();
                        if messages.mark_delivered_up_to(&recipient_hex, new_high).await.is_err() {
                            continue;
                        }
                        let now = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_secs();
                        events.emit(MessengerEvent::message_delivered(recipient_fp, new_high, now));
                    }
                }
            }
        });

        contacts.insert(
            recipient_fp,
            TrackedContact {
                token,
                last_known_watermark,
                task,
            },
        );
    }

    pub async fn last_known_watermark(&self, recipient_fp: &Fingerprint) -> Option<u64> {
        self.contacts
            .lock()
            .await
            .get(recipient_fp)
            .map(|c| c.last_known_watermark.load(Ordering::SeqCst))
    }

    pub async fn is_tracking(&self, recipient_fp: &Fingerprint) -> bool {
        self.contacts.lock().await.contains_key(recipient_fp)
    }

    pub async fn untrack(&self, dht: &DhtClient, recipient_fp: &Fingerprint) {
        if let Some(tracked) = self.contacts.lock().await.remove(recipient_fp) {
            dht.cancel_listen(tracked.token).await;
            tracked.task.abort();
        }
    }

    pub async fn untrack_all(&self, dht: &DhtClient) {
        let mut contacts = self.contacts.lock().await;
        for (_, tracked) in contacts.drain() {
            dht.cancel_listen(tracked.token).await;
            tracked.task.abort();
        }
    }
}

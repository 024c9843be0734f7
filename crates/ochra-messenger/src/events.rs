//! The engine's event bus (Section 4.3 / C3).
//!
//! The specification describes a single registered observer guarded by a
//! mutex; this engine generalizes that to the teacher daemon's existing
//! `tokio::sync::broadcast`-backed event bus so the same event stream can
//! feed multiple IPC subscribers without the engine tracking them itself.
//! Losing a slow subscriber never blocks emission — `broadcast` drops the
//! oldest buffered event for that lagging receiver instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::fingerprint::Fingerprint;

/// Events the engine dispatches (Section 6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessengerEvent {
    IdentityLoaded {
        fingerprint: String,
    },
    DhtConnected,
    DhtDisconnected,
    MessageSent {
        recipient_fp: String,
        seq: u64,
    },
    MessageDelivered {
        recipient_fp: String,
        seq_num: u64,
        timestamp: u64,
    },
    OutboxUpdated {
        contact_fp: String,
    },
    ContactRequestReceived {
        sender_fp: String,
    },
    ContactAdded {
        fingerprint: String,
    },
}

impl MessengerEvent {
    pub fn message_sent(recipient: Fingerprint, seq: u64) -> Self {
        MessengerEvent::MessageSent {
            recipient_fp: recipient.to_hex(),
            seq,
        }
    }

    pub fn message_delivered(recipient: Fingerprint, seq_num: u64, timestamp: u64) -> Self {
        MessengerEvent::MessageDelivered {
            recipient_fp: recipient.to_hex(),
            seq_num,
            timestamp,
        }
    }

    pub fn outbox_updated(contact: Fingerprint) -> Self {
        MessengerEvent::OutboxUpdated {
            contact_fp: contact.to_hex(),
        }
    }
}

/// Broadcast-backed event bus with a monotonic sequence counter.
pub struct EventBus {
    sender: broadcast::Sender<MessengerEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Dispatch an event to all current subscribers. Never blocks on a slow
    /// subscriber; a subscriber with no outstanding receiver is simply a no-op.
    pub fn emit(&self, event: MessengerEvent) -> u64 {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(event);
        seq
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MessengerEvent> {
        self.sender.subscribe()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

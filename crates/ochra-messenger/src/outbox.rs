//! Per-contact outbox listeners with UTC day-bucket rotation (Section 4.7 / C7).
//!
//! Grounded on the daemon's own `epoch.rs` epoch-number pattern: the mailbox
//! key embeds a day number (`unix_seconds / 86_400`) the same way the
//! daemon's epoch embeds a 24-hour bucket, and a periodic ticker here plays
//! the role `run_epoch_boundary` plays there, rotating every active listener
//! onto the new day's key once midnight UTC passes. Each listener also runs
//! a small forwarding task that turns a raw DHT push into an
//! [`crate::events::MessengerEvent::OutboxUpdated`], the UI-facing signal
//! that it's worth calling `check_offline_messages` for that contact.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::dht::DhtClient;
use crate::events::{EventBus, MessengerEvent};
use crate::fingerprint::Fingerprint;
use crate::{EngineError, Result};

/// Seconds in a UTC day; the mailbox key's day-bucket resolution.
pub const DAY_SECS: u64 = 24 * 60 * 60;

/// How often the rotation ticker checks whether the day number has advanced.
pub const ROTATION_TICK: Duration = Duration::from_secs(60);

/// Maximum simultaneously active listeners this registry will track.
pub const MAX_LISTENERS: usize = 128;

/// The current UTC day number: `floor(unix_seconds / 86_400)`.
pub fn current_utc_day() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now / DAY_SECS
}

/// Logical outbox base key for `contact_fp`'s mailbox to `self_fp`, before
/// day-bucketing: `"<contact_fp>:outbox:<self_fp>"`.
fn logical_base(contact_fp: &Fingerprint, self_fp: &Fingerprint) -> String {
    format!("{contact_fp}:outbox:{self_fp}")
}

/// Day-bucketed mailbox base actually used as the chunked-put key. Called
/// with the sender's fingerprint first and the recipient's second from
/// either side of a conversation: a listener tracking `contact_fp` as a
/// contact of `self_fp` watches the same key a sender with those two
/// fingerprints (in the same order) writes to.
pub fn day_bucketed_base(contact_fp: &Fingerprint, self_fp: &Fingerprint, day: u64) -> String {
    format!("{}:day:{day}", logical_base(contact_fp, self_fp))
}

struct ActiveListener {
    contact_fp: Fingerprint,
    token: u64,
    day: u64,
    notify: Arc<Notify>,
    forward_task: tokio::task::JoinHandle<()>,
}

/// Registry of per-contact outbox listeners, rotated daily (C7).
pub struct OutboxListenerRegistry {
    entries: Mutex<Vec<ActiveListener>>,
}

impl Default for OutboxListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboxListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn spawn_forwarder(
        dht: Arc<DhtClient>,
        events: Arc<EventBus>,
        contact_fp: Fingerprint,
        mut rx: tokio::sync::broadcast::Receiver<crate::dht::DhtNotification>,
        notify: Arc<Notify>,
    ) -> tokio::task::JoinHandle<()> {
        let _ = dht;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = notify.notified() => break,
                    notification = rx.recv() => {
                        if notification.is_err() {
                            break;
                        }
                        events.emit(MessengerEvent::outbox_updated(contact_fp));
                    }
                }
            }
        })
    }

    /// Start (or no-op if already active) a listener on `contact_fp`'s
    /// mailbox to `self_fp` for the current day bucket. Idempotent: calling
    /// this twice for the same contact does not create a second entry.
    pub async fn listen(
        &self,
        dht: Arc<DhtClient>,
        events: Arc<EventBus>,
        contact_fp: Fingerprint,
        self_fp: Fingerprint,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.contact_fp == contact_fp) {
            return Ok(());
        }
        if entries.len() >= MAX_LISTENERS {
            return Err(EngineError::Busy);
        }
        let day = current_utc_day();
        let base = day_bucketed_base(&contact_fp, &self_fp, day);
        // chunked_put only ever writes chunk_key(base, i); the manifest
        // chunk (index 0) is always written first, so it is the key to watch.
        let (token, rx, notify) = dht.listen(&crate::dht::chunk_key(base.as_bytes(), 0)).await;
        let forward_task = Self::spawn_forwarder(dht, events, contact_fp, rx, notify.clone());
        entries.push(ActiveListener {
            contact_fp,
            token,
            day,
            notify,
            forward_task,
        });
        Ok(())
    }

    /// Start a listener for every contact in `contacts`, skipping any
    /// already active (Section 4.7 "start all outbox listeners on login").
    pub async fn listen_all_contacts(
        &self,
        dht: Arc<DhtClient>,
        events: Arc<EventBus>,
        contacts: &[Fingerprint],
        self_fp: Fingerprint,
    ) -> Result<()> {
        for contact_fp in contacts {
            self.listen(dht.clone(), events.clone(), *contact_fp, self_fp).await?;
        }
        Ok(())
    }

    /// Cancel `contact_fp`'s listener, if active. Swap-removes the entry so
    /// cancellation is O(1) rather than preserving insertion order.
    pub async fn cancel(&self, dht: &DhtClient, contact_fp: &Fingerprint) {
        let mut entries = self.entries.lock().await;
        if let Some(pos) = entries.iter().position(|e| &e.contact_fp == contact_fp) {
            let removed = entries.swap_remove(pos);
            dht.cancel_listen(removed.token).await;
            removed.notify.notify_waiters();
            removed.forward_task.abort();
        }
    }

    /// Cancel every active listener.
    pub async fn cancel_all(&self, dht: &DhtClient) {
        let mut entries = self.entries.lock().await;
        for entry in entries.drain(..) {
            dht.cancel_listen(entry.token).await;
            entry.notify.notify_waiters();
            entry.forward_task.abort();
        }
    }

    pub async fn active_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_active(&self, contact_fp: &Fingerprint) -> bool {
        self.entries.lock().await.iter().any(|e| &e.contact_fp == contact_fp)
    }

    /// Re-subscribe every listener whose bucketed key is stale relative to
    /// `today`, replacing its token, day bucket, and forwarding task.
    async fn rotate(&self, dht: Arc<DhtClient>, events: Arc<EventBus>, self_fp: Fingerprint, today: u64) {
        let mut entries = self.entries.lock().await;
        for entry in entries.iter_mut() {
            if entry.day == today {
                continue;
            }
            dht.cancel_listen(entry.token).await;
            entry.notify.notify_waiters();
            entry.forward_task.abort();

            let base = day_bucketed_base(&entry.contact_fp, &self_fp, today);
            let (token, rx, notify) = dht.listen(&crate::dht::chunk_key(base.as_bytes(), 0)).await;
            entry.forward_task = Self::spawn_forwarder(dht.clone(), events.clone(), entry.contact_fp, rx, notify.clone());
            entry.token = token;
            entry.notify = notify;
            entry.day = today;
            debug!(contact = %entry.contact_fp, day = today, "rotated outbox listener to new day bucket");
        }
    }
}

/// Spawn the periodic day-rotation ticker for `registry`. Mirrors the
/// daemon's epoch-boundary scheduler: a plain `tokio::time::interval` loop
/// that checks the day number and rotates any stale listeners.
pub fn spawn_rotation_ticker(
    registry: Arc<OutboxListenerRegistry>,
    dht: Arc<DhtClient>,
    events: Arc<EventBus>,
    self_fp: Fingerprint,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ROTATION_TICK);
        loop {
            ticker.tick().await;
            registry.rotate(dht.clone(), events.clone(), self_fp, current_utc_day()).await;
        }
    })
}

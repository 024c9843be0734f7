//! Narrow DHT client facade for the mailbox protocol (Section 5 / C5).
//!
//! This is deliberately not [`ochra_dht`]'s Kademlia routing table or its
//! BEP-44 record store: the mailbox needs multi-valued fan-in keys
//! (`inbox:*`), a 200 KiB chunked value cap, and ML-DSA ownership rather than
//! Ed25519, none of which the low-level node's record store provides. It
//! borrows that module's signed-record-with-TTL shape and re-implements it
//! at the size and signature scheme this protocol actually needs; the real
//! node lookup/replication machinery lives below this facade, out of scope
//! here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Mutex, Notify};

use crate::{EngineError, Result};

/// Maximum bytes per chunk.
pub const MAX_CHUNK_SIZE: usize = 50 * 1024;
/// Maximum chunks per logical value (50 KiB * 4 = 200 KiB cap).
pub const MAX_CHUNKS: usize = 4;

const CHUNK_MAGIC: &[u8; 4] = b"OCCK";
const CHUNK_VERSION: u8 = 1;
const CHUNK_HEADER_LEN: usize = 4 + 1 + 1 + 1 + 4; // magic, version, total, index, size

/// Outcome of a signed put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Ok,
    /// The underlying node could not be reached; caller should retry.
    TemporaryUnavailable,
    /// A `name:`-prefixed key already holds a value owned by a different key.
    PermanentConflict,
}

/// A change delivered to a listener.
#[derive(Debug, Clone)]
pub struct DhtNotification {
    pub value: Vec<u8>,
}

#[derive(Clone)]
struct StoredEntry {
    value: Vec<u8>,
    owner_pub: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Derive the deterministic key for chunk `index` of a logical value stored
/// under `base`: `Sha3-512(base || ":chunk:" || index)[0..32]`.
pub fn chunk_key(base: &[u8], index: u8) -> [u8; 32] {
    let mut input = Vec::with_capacity(base.len() + 8);
    input.extend_from_slice(base);
    input.extend_from_slice(b":chunk:");
    input.push(index);
    let digest = ochra_crypto::sha3::hash512(&input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[0..32]);
    out
}

/// In-memory stand-in for the network-facing DHT mailbox facade. Real
/// deployments sit this in front of the node's lookup/replication pipeline;
/// tests and the rest of this crate only depend on the behavior captured
/// here.
pub struct DhtClient {
    store: Mutex<HashMap<Vec<u8>, Vec<StoredEntry>>>,
    watchers: Mutex<HashMap<Vec<u8>, broadcast::Sender<DhtNotification>>>,
    cancels: Mutex<HashMap<u64, Arc<Notify>>>,
    next_token: AtomicU64,
}

impl Default for DhtClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DhtClient {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            cancels: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Store `value` under `key`, signed by `owner_pub`'s holder.
    ///
    /// `inbox:`-prefixed keys fan in: every put appends a new entry rather
    /// than overwriting. `name:`-prefixed keys are first-writer-wins: a put
    /// from a different owner than the current holder is rejected with
    /// [`PutOutcome::PermanentConflict`]. Every other key is a single slot,
    /// overwritten unconditionally.
    pub async fn put_signed(
        &self,
        key: &[u8],
        value: Vec<u8>,
        owner_pub: &[u8],
        ttl: Duration,
    ) -> PutOutcome {
        let is_inbox = key.starts_with(b"inbox:");
        let is_name = key.starts_with(b"name:");
        let notify_value = value.clone();

        {
            let mut store = self.store.lock().await;
            let entries = store.entry(key.to_vec()).or_default();
            entries.retain(|e| !e.is_expired());

            if is_inbox {
                entries.push(StoredEntry {
                    value,
                    owner_pub: owner_pub.to_vec(),
                    stored_at: Instant::now(),
                    ttl,
                });
            } else {
                if is_name {
                    if let Some(existing) = entries.first() {
                        if existing.owner_pub != owner_pub {
                            return PutOutcome::PermanentConflict;
                        }
                    }
                }
                entries.clear();
                entries.push(StoredEntry {
                    value,
                    owner_pub: owner_pub.to_vec(),
                    stored_at: Instant::now(),
                    ttl,
                });
            }
        }

        self.notify(key, notify_value).await;
        PutOutcome::Ok
    }

    async fn notify(&self, key: &[u8], value: Vec<u8>) {
        let watchers = self.watchers.lock().await;
        if let Some(tx) = watchers.get(key) {
            let _ = tx.send(DhtNotification { value });
        }
    }

    /// Fetch the single current value at `key`, if any (non-expired).
    pub async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut store = self.store.lock().await;
        let entries = store.get_mut(key)?;
        entries.retain(|e| !e.is_expired());
        entries.first().map(|e| e.value.clone())
    }

    /// Fetch every current entry at `key` (used for `inbox:` fan-in keys).
    pub async fn get_all(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let mut store = self.store.lock().await;
        match store.get_mut(key) {
            Some(entries) => {
                entries.retain(|e| !e.is_expired());
                entries.iter().map(|e| e.value.clone()).collect()
            }
            None => Vec::new(),
        }
    }

    /// Remove one entry matching `value` from an `inbox:`-style fan-in key,
    /// used once a message has been consumed and relayed.
    pub async fn remove_entry(&self, key: &[u8], value: &[u8]) {
        let mut store = self.store.lock().await;
        if let Some(entries) = store.get_mut(key) {
            if let Some(pos) = entries.iter().position(|e| e.value == value) {
                entries.remove(pos);
            }
        }
    }

    /// Subscribe to changes at `key`. Returns a cancellation token, the
    /// receiver, and a [`Notify`] the caller can await alongside `recv()` to
    /// support deterministic shutdown.
    pub async fn listen(&self, key: &[u8]) -> (u64, broadcast::Receiver<DhtNotification>, Arc<Notify>) {
        let mut watchers = self.watchers.lock().await;
        let tx = watchers
            .entry(key.to_vec())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone();
        let rx = tx.subscribe();
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        let notify = Arc::new(Notify::new());
        self.cancels.lock().await.insert(token, notify.clone());
        (token, rx, notify)
    }

    /// Cancel a previously-issued `listen` token, waking its waiter.
    pub async fn cancel_listen(&self, token: u64) {
        if let Some(notify) = self.cancels.lock().await.remove(&token) {
            notify.notify_waiters();
        }
    }

    /// Split `blob` into up to [`MAX_CHUNKS`] chunks of at most
    /// [`MAX_CHUNK_SIZE`] bytes, wire-format each with a self-describing
    /// header (`magic(4) || version(1) || total_chunks(1) || chunk_index(1)
    /// || chunk_size(u32 LE) || data`), and put each under
    /// `chunk_key(base, index)`.
    pub async fn chunked_put(
        &self,
        base: &[u8],
        blob: &[u8],
        owner_pub: &[u8],
        ttl: Duration,
    ) -> Result<PutOutcome> {
        let raw_chunks: Vec<&[u8]> = if blob.is_empty() {
            vec![&[][..]]
        } else {
            blob.chunks(MAX_CHUNK_SIZE).collect()
        };
        if raw_chunks.len() > MAX_CHUNKS {
            return Err(EngineError::InvalidArg(format!(
                "value requires {} chunks, maximum is {MAX_CHUNKS}",
                raw_chunks.len()
            )));
        }
        let total = raw_chunks.len() as u8;

        for (i, data) in raw_chunks.iter().enumerate() {
            let mut wire = Vec::with_capacity(CHUNK_HEADER_LEN + data.len());
            wire.extend_from_slice(CHUNK_MAGIC);
            wire.push(CHUNK_VERSION);
            wire.push(total);
            wire.push(i as u8);
            wire.extend_from_slice(&(data.len() as u32).to_le_bytes());
            wire.extend_from_slice(data);

            let key = chunk_key(base, i as u8);
            let outcome = self.put_signed(&key, wire, owner_pub, ttl).await;
            if outcome != PutOutcome::Ok {
                return Ok(outcome);
            }
        }
        Ok(PutOutcome::Ok)
    }

    /// Reassemble a value previously written with [`Self::chunked_put`].
    /// Returns `None` if any chunk is missing, malformed, or inconsistent.
    pub async fn chunked_get(&self, base: &[u8]) -> Option<Vec<u8>> {
        let chunk0 = self.get(&chunk_key(base, 0)).await?;
        let (total, mut out) = decode_chunk(&chunk0, 0)?;
        for i in 1..total {
            let raw = self.get(&chunk_key(base, i)).await?;
            let (_, data) = decode_chunk(&raw, i)?;
            out.extend_from_slice(&data);
        }
        Some(out)
    }
}

fn decode_chunk(raw: &[u8], expected_index: u8) -> Option<(u8, Vec<u8>)> {
    if raw.len() < CHUNK_HEADER_LEN || &raw[0..4] != CHUNK_MAGIC || raw[4] != CHUNK_VERSION {
        return None;
    }
    let total = raw[5];
    let index = raw[6];
    if index != expected_index {
        return None;
    }
    let size = u32::from_le_bytes(raw[7..11].try_into().ok()?) as usize;
    if raw.len() < CHUNK_HEADER_LEN + size {
        return None;
    }
    Some((total, raw[CHUNK_HEADER_LEN..CHUNK_HEADER_LEN + size].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dht = DhtClient::new();
        dht.put_signed(b"k1", b"v1".to_vec(), b"owner-a", TTL).await;
        assert_eq!(dht.get(b"k1").await, Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_non_name_key_overwrite_allowed_any_owner() {
        let dht = DhtClient::new();
        dht.put_signed(b"k1", b"v1".to_vec(), b"owner-a", TTL).await;
        let outcome = dht.put_signed(b"k1", b"v2".to_vec(), b"owner-b", TTL).await;
        assert_eq!(outcome, PutOutcome::Ok);
        assert_eq!(dht.get(b"k1").await, Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_name_key_rejects_different_owner() {
        let dht = DhtClient::new();
        dht.put_signed(b"name:alice", b"fp-a".to_vec(), b"owner-a", TTL).await;
        let outcome = dht
            .put_signed(b"name:alice", b"fp-b".to_vec(), b"owner-b", TTL)
            .await;
        assert_eq!(outcome, PutOutcome::PermanentConflict);
        assert_eq!(dht.get(b"name:alice").await, Some(b"fp-a".to_vec()));
    }

    #[tokio::test]
    async fn test_name_key_allows_same_owner_update() {
        let dht = DhtClient::new();
        dht.put_signed(b"name:alice", b"fp-a".to_vec(), b"owner-a", TTL).await;
        let outcome = dht
            .put_signed(b"name:alice", b"fp-a-v2".to_vec(), b"owner-a", TTL)
            .await;
        assert_eq!(outcome, PutOutcome::Ok);
    }

    #[tokio::test]
    async fn test_inbox_key_fans_in() {
        let dht = DhtClient::new();
        dht.put_signed(b"inbox:bob:0", b"msg1".to_vec(), b"alice", TTL).await;
        dht.put_signed(b"inbox:bob:0", b"msg2".to_vec(), b"carol", TTL).await;
        let all = dht.get_all(b"inbox:bob:0").await;
        assert_eq!(all.len(), 2);
        assert!(all.contains(&b"msg1".to_vec()));
        assert!(all.contains(&b"msg2".to_vec()));
    }

    #[tokio::test]
    async fn test_remove_entry_from_inbox() {
        let dht = DhtClient::new();
        dht.put_signed(b"inbox:bob:0", b"msg1".to_vec(), b"alice", TTL).await;
        dht.remove_entry(b"inbox:bob:0", b"msg1").await;
        assert!(dht.get_all(b"inbox:bob:0").await.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_not_returned() {
        let dht = DhtClient::new();
        dht.put_signed(b"k1", b"v1".to_vec(), b"owner-a", Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(dht.get(b"k1").await, None);
    }

    #[tokio::test]
    async fn test_listener_receives_update() {
        let dht = DhtClient::new();
        let (_, mut rx, _notify) = dht.listen(b"k1").await;
        dht.put_signed(b"k1", b"v1".to_vec(), b"owner-a", TTL).await;
        let notification = rx.recv().await.expect("notification");
        assert_eq!(notification.value, b"v1");
    }

    #[tokio::test]
    async fn test_cancel_listen_wakes_waiter() {
        let dht = DhtClient::new();
        let (token, _rx, notify) = dht.listen(b"k1").await;
        let notify2 = notify.clone();
        let waited = tokio::spawn(async move {
            notify2.notified().await;
        });
        dht.cancel_listen(token).await;
        waited.await.expect("task");
    }

    #[tokio::test]
    async fn test_chunked_roundtrip_single_chunk() {
        let dht = DhtClient::new();
        let blob = b"small profile blob".to_vec();
        let outcome = dht.chunked_put(b"profile:alice", &blob, b"owner-a", TTL).await.expect("put");
        assert_eq!(outcome, PutOutcome::Ok);
        assert_eq!(dht.chunked_get(b"profile:alice").await, Some(blob));
    }

    #[tokio::test]
    async fn test_chunked_roundtrip_multi_chunk() {
        let dht = DhtClient::new();
        let blob = vec![0x7au8; MAX_CHUNK_SIZE * 3 + 123];
        dht.chunked_put(b"profile:bob", &blob, b"owner-b", TTL).await.expect("put");
        assert_eq!(dht.chunked_get(b"profile:bob").await, Some(blob));
    }

    #[tokio::test]
    async fn test_chunked_put_rejects_oversized_value() {
        let dht = DhtClient::new();
        let blob = vec![0u8; MAX_CHUNK_SIZE * MAX_CHUNKS + 1];
        let err = dht.chunked_put(b"profile:huge", &blob, b"owner-a", TTL).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArg(_)));
    }

    #[tokio::test]
    async fn test_chunked_get_missing_returns_none() {
        let dht = DhtClient::new();
        assert_eq!(dht.chunked_get(b"profile:nobody").await, None);
    }
}

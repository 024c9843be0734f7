//! Narrow persistence facades over [`ochra_db`]'s messenger query modules.
//!
//! Mirrors the daemon's own `Arc<tokio::sync::Mutex<rusqlite::Connection>>`
//! pattern: the lock is held only across the synchronous rusqlite call, never
//! across an `.await` boundary.

use std::path::Path;
use std::sync::Arc;

use ochra_db::queries::{messenger_contacts, messenger_messages, messenger_profiles};
use tokio::sync::Mutex;

use crate::Result;

/// Per-identity contacts + pending-request store (`<fp>_contacts.db`).
pub struct ContactsDb {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl ContactsDb {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open(path)?)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open_memory()?)),
        })
    }

    pub async fn insert(&self, fingerprint: &str, notes: Option<&str>, added_at: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::insert(&conn, fingerprint, notes, added_at)?)
    }

    pub async fn get(&self, fingerprint: &str) -> Result<messenger_contacts::ContactRow> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::get(&conn, fingerprint)?)
    }

    pub async fn list(&self) -> Result<Vec<messenger_contacts::ContactRow>> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::list(&conn)?)
    }

    pub async fn remove(&self, fingerprint: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::remove(&conn, fingerprint)?)
    }

    pub async fn set_blocked(&self, fingerprint: &str, blocked: bool) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::set_blocked(&conn, fingerprint, blocked)?)
    }

    pub async fn exists(&self, fingerprint: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::exists(&conn, fingerprint)?)
    }

    pub async fn upsert_pending_request(
        &self,
        sender_fp: &str,
        sender_name: Option<&str>,
        message: Option<&str>,
        received_at: u64,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::upsert_pending_request(
            &conn,
            sender_fp,
            sender_name,
            message,
            received_at,
        )?)
    }

    pub async fn list_pending_requests(&self) -> Result<Vec<messenger_contacts::PendingRequestRow>> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::list_pending_requests(&conn)?)
    }

    pub async fn remove_pending_request(&self, sender_fp: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_contacts::remove_pending_request(&conn, sender_fp)?)
    }
}

/// Per-identity conversation store (shares `<fp>_contacts.db` physically in
/// this implementation, kept as a distinct facade type at the API boundary
/// since the schema and spec both treat messages as their own concern).
pub struct MessageStore {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl MessageStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open(path)?)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open_memory()?)),
        })
    }

    pub async fn insert_outbound(&self, recipient_fp: &str, seq: u64, plaintext: &[u8], queued_at: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::insert_outbound(&conn, recipient_fp, seq, plaintext, queued_at)?)
    }

    /// Returns `false` if this `(sender_fp, seq)` was already stored.
    pub async fn insert_inbound(&self, sender_fp: &str, seq: u64, plaintext: &[u8], received_at: u64) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::insert_inbound(&conn, sender_fp, seq, plaintext, received_at)?)
    }

    pub async fn set_status(&self, recipient_fp: &str, seq: u64, status: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::set_status(&conn, recipient_fp, seq, status)?)
    }

    pub async fn mark_delivered_up_to(&self, recipient_fp: &str, watermark: u64) -> Result<usize> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::mark_delivered_up_to(&conn, recipient_fp, watermark)?)
    }

    pub async fn list_conversation(&self, peer_fp: &str) -> Result<Vec<messenger_messages::MessageRow>> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::list_conversation(&conn, peer_fp)?)
    }

    pub async fn next_outbound_seq(&self, recipient_fp: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        Ok(messenger_messages::next_outbound_seq(&conn, recipient_fp)?)
    }
}

/// Per-identity profile cache store (`<fp>_profiles.db`).
pub struct ProfileDb {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl ProfileDb {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open(path)?)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(ochra_db::open_memory()?)),
        })
    }

    pub async fn put(&self, fingerprint: &str, profile_json: &str, fetched_at: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_profiles::put(&conn, fingerprint, profile_json, fetched_at)?)
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<messenger_profiles::CachedProfileRow>> {
        let conn = self.conn.lock().await;
        Ok(messenger_profiles::get(&conn, fingerprint)?)
    }

    pub async fn invalidate(&self, fingerprint: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_profiles::invalidate(&conn, fingerprint)?)
    }

    pub async fn set_name(&self, fingerprint: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(messenger_profiles::set_name(&conn, fingerprint, name)?)
    }

    pub async fn get_name(&self, fingerprint: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        Ok(messenger_profiles::get_name(&conn, fingerprint)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contacts_db_roundtrip() {
        let db = ContactsDb::open_memory().expect("open");
        db.insert("fp-a", Some("met at conf"), 1_000).await.expect("insert");
        let row = db.get("fp-a").await.expect("get");
        assert_eq!(row.notes.as_deref(), Some("met at conf"));
        assert!(db.exists("fp-a").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_message_store_seq_allocation() {
        let store = MessageStore::open_memory().expect("open");
        assert_eq!(store.next_outbound_seq("bob").await.expect("seq"), 1);
        store.insert_outbound("bob", 1, b"hi", 100).await.expect("insert");
        assert_eq!(store.next_outbound_seq("bob").await.expect("seq"), 2);
    }

    #[tokio::test]
    async fn test_profile_db_roundtrip() {
        let db = ProfileDb::open_memory().expect("open");
        assert!(db.get("fp-a").await.expect("get").is_none());
        db.put("fp-a", "{\"display_name\":\"Alice\"}", 1_000).await.expect("put");
        assert!(db.get("fp-a").await.expect("get").is_some());
    }
}

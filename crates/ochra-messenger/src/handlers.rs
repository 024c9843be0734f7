//! Business logic for each task type (Section 4.10 / C10).
//!
//! Every function here operates on an already-loaded [`crate::engine::Session`]
//! — the facades for C4 through C9 plus the loaded identity's key material —
//! and implements exactly one CORE operation from Section 6. Handlers for the
//! non-core task kinds (groups, wallets, presence, social feed) live at the
//! bottom of this module as thin stubs returning [`EngineError::NotImplemented`];
//! they exist so [`crate::task::TaskKind`] dispatch stays exhaustive without
//! reaching back into business logic this engine doesn't own.

use std::sync::atomic::Ordering;
use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use ochra_db::queries::{messenger_contacts::PendingRequestRow, messenger_messages};

use crate::delivery;
use crate::dht::PutOutcome;
use crate::engine::Session;
use crate::events::MessengerEvent;
use crate::fingerprint::Fingerprint;
use crate::keyserver::{self, Profile, Socials, Wallets, RECORD_TTL};
use crate::outbox;
use crate::{EngineError, Result};

/// TTL for mailbox messages; shorter-lived than profile/name records since
/// an undelivered message loses relevance once offline-pickup has a chance
/// to run.
pub const MAILBOX_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn contact_request_key(recipient_fp: &Fingerprint) -> String {
    format!("inbox:{recipient_fp}")
}

/// The reciprocal acceptance body (Section 3, 4.10): a contact request
/// carrying exactly this message is treated as an acceptance of a prior
/// request, not a new one.
const CONTACT_REQUEST_ACCEPTED: &str = "Contact request accepted";

fn contacts_backup_key(self_fp: &Fingerprint) -> String {
    format!("contactlist:{self_fp}")
}

/// A signed contact request, fanned into the recipient's inbox key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContactRequestEnvelope {
    sender_fp: Fingerprint,
    sender_name: Option<String>,
    message: Option<String>,
    dsa_pubkey: Vec<u8>,
    timestamp: u64,
    signature: Vec<u8>,
}

#[derive(Serialize)]
struct ContactRequestFields<'a> {
    sender_fp: &'a Fingerprint,
    sender_name: &'a Option<String>,
    message: &'a Option<String>,
    dsa_pubkey: &'a [u8],
    timestamp: u64,
}

impl ContactRequestEnvelope {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = ContactRequestFields {
            sender_fp: &self.sender_fp,
            sender_name: &self.sender_name,
            message: &self.message,
            dsa_pubkey: &self.dsa_pubkey,
            timestamp: self.timestamp,
        };
        serde_json::to_vec(&fields).expect("contact request fields are always serializable")
    }

    fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }
}

/// One encrypted, sequenced message. A day bucket's chunked value is a
/// serialized `Vec<MailboxMessage>` (Section 3 OfflineMessage: "ordered list
/// of `{seq, ciphertext, encrypted_timestamp}`"), not a single entry — see
/// [`send_message`]/[`check_offline_messages`]. `ciphertext` is
/// `Aes256Gcm(shared_secret, nonce, sender_fp(64) || ts(u64 LE) || plaintext)`
/// (Section 6); `timestamp`/`signature` cover the envelope itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MailboxMessage {
    sender_fp: Fingerprint,
    seq: u64,
    kem_ciphertext: Vec<u8>,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    dsa_pubkey: Vec<u8>,
    timestamp: u64,
    signature: Vec<u8>,
}

#[derive(Serialize)]
struct MailboxMessageFields<'a> {
    sender_fp: &'a Fingerprint,
    seq: u64,
    kem_ciphertext: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
    dsa_pubkey: &'a [u8],
    timestamp: u64,
}

impl MailboxMessage {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = MailboxMessageFields {
            sender_fp: &self.sender_fp,
            seq: self.seq,
            kem_ciphertext: &self.kem_ciphertext,
            nonce: &self.nonce,
            ciphertext: &self.ciphertext,
            dsa_pubkey: &self.dsa_pubkey,
            timestamp: self.timestamp,
        };
        serde_json::to_vec(&fields).expect("mailbox message fields are always serializable")
    }

    fn sign(&mut self, dsa: &ochra_crypto::pq::DsaKeyPair, timestamp: u64) {
        self.timestamp = timestamp;
        self.signature = dsa.sign(&self.canonical_bytes());
    }

    fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }
}

/// A contact row enriched with its cached display name, for `get_contacts`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSummary {
    pub fingerprint: String,
    pub display_name: Option<String>,
    pub notes: Option<String>,
    pub added_at: u64,
    pub is_blocked: bool,
}

// ---------------------------------------------------------------------
// Contacts (Section 4.10: get_contacts, add_contact, remove_contact, block)
// ---------------------------------------------------------------------

pub async fn get_contacts(session: &Session) -> Result<Vec<ContactSummary>> {
    let rows = session.contacts.list().await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let fp = Fingerprint::parse(&row.fingerprint).ok();
        let display_name = match fp {
            Some(fp) => session.profiles.cached_display_name(&fp).await.unwrap_or(None),
            None => None,
        };
        out.push(ContactSummary {
            fingerprint: row.fingerprint,
            display_name,
            notes: row.notes,
            added_at: row.added_at,
            is_blocked: row.is_blocked,
        });
    }
    Ok(out)
}

/// Insert `fingerprint` as a new contact and start its listeners, without
/// syncing the contact list to the DHT. Shared by [`add_contact`] and the
/// auto-add-on-acceptance paths ([`get_contact_requests`],
/// [`approve_contact_request`]) that need to batch their own sync instead
/// of triggering one per contact. A caller that already has this
/// fingerprint as a contact gets [`EngineError::AlreadyExists`] rather than
/// the raw database constraint error (Section 4.10: "Duplicate →
/// AlreadyExists").
async fn add_contact_no_sync(session: &Session, fingerprint: Fingerprint, notes: Option<String>) -> Result<()> {
    match session.contacts.insert(&fingerprint.to_hex(), notes.as_deref(), now()).await {
        Ok(()) => {}
        Err(EngineError::Database(ochra_db::DbError::Constraint(_))) => return Err(EngineError::AlreadyExists),
        Err(other) => return Err(other),
    }
    session
        .outbox
        .listen(session.dht.clone(), session.events.clone(), fingerprint, session.fp)
        .await?;
    session
        .delivery
        .track(session.dht.clone(), fingerprint, session.messages.clone(), session.events.clone())
        .await;
    session.events.emit(MessengerEvent::ContactAdded {
        fingerprint: fingerprint.to_hex(),
    });
    Ok(())
}

/// Insert `fingerprint` as a new contact, start its listeners, and sync the
/// contact list to the DHT on success (Section 4.10: "on success sync
/// contact list to DHT").
pub async fn add_contact(session: &Session, fingerprint: Fingerprint, notes: Option<String>) -> Result<()> {
    add_contact_no_sync(session, fingerprint, notes).await?;
    let _ = sync_contacts_to_dht(session).await;
    Ok(())
}

pub async fn remove_contact(session: &Session, fingerprint: Fingerprint) -> Result<()> {
    session.contacts.remove(&fingerprint.to_hex()).await?;
    session.outbox.cancel(&session.dht, &fingerprint).await;
    session.delivery.untrack(&session.dht, &fingerprint).await;
    Ok(())
}

pub async fn block_user(session: &Session, fingerprint: Fingerprint) -> Result<()> {
    session.contacts.set_blocked(&fingerprint.to_hex(), true).await?;
    session.outbox.cancel(&session.dht, &fingerprint).await;
    session.delivery.untrack(&session.dht, &fingerprint).await;
    Ok(())
}

pub async fn unblock_user(session: &Session, fingerprint: Fingerprint) -> Result<()> {
    session.contacts.set_blocked(&fingerprint.to_hex(), false).await
}

pub async fn get_blocked_users(session: &Session) -> Result<Vec<ContactSummary>> {
    Ok(get_contacts(session).await?.into_iter().filter(|c| c.is_blocked).collect())
}

// ---------------------------------------------------------------------
// Contact requests (Section 4.10: send/get/approve/deny contact request)
// ---------------------------------------------------------------------

pub async fn send_contact_request(session: &Session, target_fp: Fingerprint, message: Option<String>) -> Result<()> {
    let sender_name = session.profiles.cached_display_name(&session.fp).await?;
    let ts = now();
    let mut envelope = ContactRequestEnvelope {
        sender_fp: session.fp,
        sender_name,
        message,
        dsa_pubkey: session.dsa.public_key.clone(),
        timestamp: ts,
        signature: Vec::new(),
    };
    envelope.signature = session.dsa.sign(&envelope.canonical_bytes());
    let blob = serde_json::to_vec(&envelope).map_err(|e| EngineError::Internal(e.to_string()))?;
    let outcome = session
        .dht
        .put_signed(contact_request_key(&target_fp).as_bytes(), blob, &session.dsa.public_key, RECORD_TTL)
        .await;
    match outcome {
        PutOutcome::Ok => Ok(()),
        PutOutcome::TemporaryUnavailable => Err(EngineError::Network),
        PutOutcome::PermanentConflict => {
            Err(EngineError::Internal("unexpected conflict on contact request inbox key".into()))
        }
    }
}

/// Drain every pending envelope from this identity's contact-request inbox.
/// A request whose body is the reciprocal acceptance message
/// ([`CONTACT_REQUEST_ACCEPTED`]) directly adds its sender as a contact
/// instead of queuing a pending request; blocked senders are skipped
/// entirely. Any number of auto-added contacts trigger exactly one contact
/// list sync to the DHT, not one per contact (Section 4.10, scenario 2).
/// Returns the full locally stored pending-request list.
pub async fn get_contact_requests(session: &Session) -> Result<Vec<PendingRequestRow>> {
    let key = contact_request_key(&session.fp);
    let raw_entries = session.dht.get_all(key.as_bytes()).await;
    let mut contacts_changed = false;
    for raw in &raw_entries {
        let Ok(envelope) = serde_json::from_slice::<ContactRequestEnvelope>(raw) else {
            continue;
        };
        if envelope.verify().is_err() {
            continue;
        }
        let sender_hex = envelope.sender_fp.to_hex();
        if session.contacts.get(&sender_hex).await.map(|c| c.is_blocked).unwrap_or(false) {
            session.dht.remove_entry(key.as_bytes(), raw).await;
            continue;
        }
        if envelope.message.as_deref() == Some(CONTACT_REQUEST_ACCEPTED) {
            match add_contact_no_sync(session, envelope.sender_fp, envelope.sender_name.clone()).await {
                Ok(()) | Err(EngineError::AlreadyExists) => contacts_changed = true,
                Err(err) => return Err(err),
            }
        } else {
            session
                .contacts
                .upsert_pending_request(
                    &sender_hex,
                    envelope.sender_name.as_deref(),
                    envelope.message.as_deref(),
                    envelope.timestamp,
                )
                .await?;
            session.events.emit(MessengerEvent::ContactRequestReceived {
                sender_fp: sender_hex,
            });
        }
        session.dht.remove_entry(key.as_bytes(), raw).await;
    }
    if contacts_changed {
        sync_contacts_to_dht(session).await?;
    }
    session.contacts.list_pending_requests().await
}

/// Mark `sender_fp` approved locally, send it a reciprocal
/// [`CONTACT_REQUEST_ACCEPTED`] request, then sync the contact list once
/// (Section 4.10).
pub async fn approve_contact_request(session: &Session, sender_fp: Fingerprint) -> Result<()> {
    let pending = session.contacts.list_pending_requests().await?;
    let matched = pending.into_iter().find(|r| r.sender_fp == sender_fp.to_hex());
    let notes = matched.and_then(|r| r.message);
    add_contact_no_sync(session, sender_fp, notes).await?;
    session.contacts.remove_pending_request(&sender_fp.to_hex()).await?;
    send_contact_request(session, sender_fp, Some(CONTACT_REQUEST_ACCEPTED.to_string())).await?;
    sync_contacts_to_dht(session).await
}

pub async fn deny_contact_request(session: &Session, sender_fp: Fingerprint) -> Result<()> {
    session.contacts.remove_pending_request(&sender_fp.to_hex()).await
}

// ---------------------------------------------------------------------
// Profile / name (Section 4.6, 4.10)
// ---------------------------------------------------------------------

pub async fn get_display_name(session: &Session, fp: Fingerprint) -> Result<Option<String>> {
    if let Some(name) = session.profiles.cached_display_name(&fp).await? {
        return Ok(Some(name));
    }
    let profile = session.profiles.get_or_fetch(&session.dht, &fp, now()).await?;
    if let Some(name) = &profile.display_name {
        session.profiles.set_display_name(&fp, name).await?;
    }
    Ok(profile.display_name)
}

pub async fn get_avatar(session: &Session, fp: Fingerprint) -> Result<Option<String>> {
    let profile = session.profiles.get_or_fetch(&session.dht, &fp, now()).await?;
    Ok(profile.avatar_b64)
}

pub async fn lookup_name(session: &Session, name: String) -> Result<Fingerprint> {
    keyserver::lookup_name(&session.dht, &name).await
}

pub async fn get_profile(session: &Session, fp: Fingerprint) -> Result<Profile> {
    session.profiles.get_or_fetch(&session.dht, &fp, now()).await
}

/// Always refreshes from the DHT. An invalid signature on the fetched
/// profile triggers the auto-remove-contact policy (Section 7's flagged
/// open question): if `fp` is a known contact, it is dropped along with its
/// listeners before the error is returned.
pub async fn lookup_profile(session: &Session, fp: Fingerprint) -> Result<Profile> {
    match session.profiles.refresh(&session.dht, &fp, now()).await {
        Ok(profile) => Ok(profile),
        Err(EngineError::InvalidSignature) => {
            let _ = session.profiles.invalidate(&fp).await;
            if session.contacts.exists(&fp.to_hex()).await.unwrap_or(false) {
                let _ = remove_contact(session, fp).await;
            }
            Err(EngineError::InvalidSignature)
        }
        Err(other) => Err(other),
    }
}

pub async fn get_registered_name(session: &Session) -> Result<Option<String>> {
    Ok(session.registered_name.lock().await.clone())
}

pub async fn register_name(session: &Session, name: String) -> Result<()> {
    let profile = current_or_blank_profile(session).await?;
    let ts = now();
    keyserver::publish(&session.dht, &session.fp, Some(&name), &profile, &session.dsa, ts).await?;
    session.profile_published_at.store(ts, Ordering::SeqCst);
    *session.registered_name.lock().await = Some(name.to_lowercase());
    Ok(())
}

#[derive(Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_b64: Option<String>,
    pub wallets: Option<Wallets>,
    pub socials: Option<Socials>,
}

async fn current_or_blank_profile(session: &Session) -> Result<Profile> {
    if let Some(cached) = session.profiles.get_cached(&session.fp).await? {
        return Ok(cached);
    }
    Ok(Profile {
        display_name: None,
        wallets: Wallets::default(),
        socials: Socials::default(),
        bio: None,
        avatar_b64: None,
        dsa_pubkey: session.dsa.public_key.clone(),
        kem_pubkey: session.kem.public_key.clone(),
        timestamp: 0,
        signature: Vec::new(),
    })
}

pub async fn update_profile(session: &Session, update: ProfileUpdate) -> Result<()> {
    let mut profile = current_or_blank_profile(session).await?;
    if let Some(name) = update.display_name {
        profile.display_name = Some(name);
    }
    if let Some(bio) = update.bio {
        profile.bio = Some(bio);
    }
    if let Some(avatar) = update.avatar_b64 {
        profile.avatar_b64 = Some(avatar);
    }
    if let Some(wallets) = update.wallets {
        profile.wallets = wallets;
    }
    if let Some(socials) = update.socials {
        profile.socials = socials;
    }
    let ts = now();
    profile.sign(&session.dsa, ts);
    let registered_name = session.registered_name.lock().await.clone();
    keyserver::publish(&session.dht, &session.fp, registered_name.as_deref(), &profile, &session.dsa, ts).await?;
    session.profiles.store(&session.fp, &profile, ts).await?;
    session.profile_published_at.store(ts, Ordering::SeqCst);
    Ok(())
}

// ---------------------------------------------------------------------
// Messages (Section 4.9, 4.10)
// ---------------------------------------------------------------------

/// Length of the embedded header inside a mailbox message's encrypted body:
/// the sender's raw 64-byte fingerprint followed by an 8-byte LE timestamp.
const ENCRYPTED_BODY_HEADER_LEN: usize = 64 + 8;

pub async fn send_message(session: &Session, recipient_fp: Fingerprint, plaintext: Vec<u8>) -> Result<u64> {
    let recipient_profile = session.profiles.get_or_fetch(&session.dht, &recipient_fp, now()).await?;
    let (shared_secret, kem_ciphertext) = ochra_crypto::pq::encapsulate(&recipient_profile.kem_pubkey)?;

    let mut nonce = [0u8; ochra_crypto::aes256gcm::NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let seq = session.messages.next_outbound_seq(&recipient_fp.to_hex()).await?;
    let ts = now();

    // encrypted_body = sender_fp(64) || ts(u64 LE) || plaintext, all inside
    // the AEAD (Section 6); no additional authenticated data is used.
    let mut body = Vec::with_capacity(ENCRYPTED_BODY_HEADER_LEN + plaintext.len());
    body.extend_from_slice(&session.fp.0);
    body.extend_from_slice(&ts.to_le_bytes());
    body.extend_from_slice(&plaintext);
    let ciphertext = ochra_crypto::aes256gcm::encrypt(&shared_secret, &nonce, &body, b"")?;

    let mut message = MailboxMessage {
        sender_fp: session.fp,
        seq,
        kem_ciphertext,
        nonce: nonce.to_vec(),
        ciphertext,
        dsa_pubkey: session.dsa.public_key.clone(),
        timestamp: ts,
        signature: Vec::new(),
    };
    message.sign(&session.dsa, ts);

    let day = outbox::current_utc_day();
    // Written from the sender's own perspective: the recipient's listener
    // for this contact computes the identical key from their side.
    let base = outbox::day_bucketed_base(&session.fp, &recipient_fp, day);

    // The day bucket is an ordered list of every message sent today, not a
    // single slot (Section 3 OfflineMessage): read-modify-append rather than
    // overwrite, since `chunked_put` on a non-`inbox:` key replaces whatever
    // was there.
    let mut bucket: Vec<MailboxMessage> = match session.dht.chunked_get(base.as_bytes()).await {
        Some(existing) => serde_json::from_slice(&existing).map_err(|e| EngineError::Internal(e.to_string()))?,
        None => Vec::new(),
    };
    bucket.push(message);
    let blob = serde_json::to_vec(&bucket).map_err(|e| EngineError::Internal(e.to_string()))?;
    session.dht.chunked_put(base.as_bytes(), &blob, &session.dsa.public_key, MAILBOX_TTL).await?;

    session.messages.insert_outbound(&recipient_fp.to_hex(), seq, &plaintext, ts).await?;
    session
        .messages
        .set_status(&recipient_fp.to_hex(), seq, messenger_messages::STATUS_SENT)
        .await?;
    session.events.emit(MessengerEvent::message_sent(recipient_fp, seq));
    Ok(seq)
}

pub async fn get_conversation(session: &Session, peer_fp: Fingerprint) -> Result<Vec<messenger_messages::MessageRow>> {
    session.messages.list_conversation(&peer_fp.to_hex()).await
}

/// Poll `contact_fp`'s mailbox to this identity for today's bucket, decrypt
/// and store every not-yet-seen message in the bucket's ordered list, then
/// publish a watermark covering the highest sequence number processed.
/// Returns the number of messages newly inserted (already-seen seqs, e.g.
/// from a prior poll this same day, are skipped rather than recounted).
pub async fn check_offline_messages(session: &Session, contact_fp: Fingerprint) -> Result<usize> {
    let day = outbox::current_utc_day();
    let base = outbox::day_bucketed_base(&contact_fp, &session.fp, day);
    let Some(blob) = session.dht.chunked_get(base.as_bytes()).await else {
        return Ok(0);
    };
    let bucket: Vec<MailboxMessage> = serde_json::from_slice(&blob).map_err(|e| EngineError::Internal(e.to_string()))?;

    let mut delivered = 0usize;
    let mut watermark: Option<u64> = None;
    for message in &bucket {
        message.verify().map_err(|_| EngineError::InvalidSignature)?;
        if message.sender_fp != contact_fp {
            return Err(EngineError::InvalidArg("mailbox sender mismatch".into()));
        }

        let nonce: [u8; ochra_crypto::aes256gcm::NONCE_SIZE] = message
            .nonce
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::Internal("malformed mailbox nonce".into()))?;
        let shared_secret = ochra_crypto::pq::decapsulate(&session.kem, &message.kem_ciphertext)?;
        let body = ochra_crypto::aes256gcm::decrypt(&shared_secret, &nonce, &message.ciphertext, b"")?;
        if body.len() < ENCRYPTED_BODY_HEADER_LEN {
            return Err(EngineError::Internal("malformed mailbox message body".into()));
        }
        if body[..64] != contact_fp.0[..] {
            return Err(EngineError::InvalidArg("mailbox embedded fingerprint mismatch".into()));
        }
        let plaintext = &body[ENCRYPTED_BODY_HEADER_LEN..];

        if session
            .messages
            .insert_inbound(&contact_fp.to_hex(), message.seq, plaintext, now())
            .await?
        {
            delivered += 1;
        }
        watermark = Some(watermark.map_or(message.seq, |w| w.max(message.seq)));
    }

    if let Some(watermark) = watermark {
        delivery::publish_watermark(&session.dht, contact_fp, session.fp, watermark, &session.dsa, now()).await?;
    }

    Ok(delivered)
}

// ---------------------------------------------------------------------
// Contact list backup (Section 4.10: sync_contacts_to_dht / from_dht)
// ---------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ContactsBackup {
    fingerprints: Vec<String>,
    timestamp: u64,
    dsa_pubkey: Vec<u8>,
    signature: Vec<u8>,
}

#[derive(Serialize)]
struct ContactsBackupFields<'a> {
    fingerprints: &'a [String],
    timestamp: u64,
    dsa_pubkey: &'a [u8],
}

impl ContactsBackup {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = ContactsBackupFields {
            fingerprints: &self.fingerprints,
            timestamp: self.timestamp,
            dsa_pubkey: &self.dsa_pubkey,
        };
        serde_json::to_vec(&fields).expect("contacts backup fields are always serializable")
    }

    fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }
}

pub async fn sync_contacts_to_dht(session: &Session) -> Result<()> {
    let rows = session.contacts.list().await?;
    let ts = now();
    let mut backup = ContactsBackup {
        fingerprints: rows.into_iter().map(|r| r.fingerprint).collect(),
        timestamp: ts,
        dsa_pubkey: session.dsa.public_key.clone(),
        signature: Vec::new(),
    };
    backup.signature = session.dsa.sign(&backup.canonical_bytes());
    let blob = serde_json::to_vec(&backup).map_err(|e| EngineError::Internal(e.to_string()))?;
    session
        .dht
        .chunked_put(contacts_backup_key(&session.fp).as_bytes(), &blob, &session.dsa.public_key, RECORD_TTL)
        .await?;
    Ok(())
}

/// Merge any fingerprints found in this identity's own DHT-stored contact
/// backup into the local contacts table. Duplicates are skipped, not errors.
pub async fn sync_contacts_from_dht(session: &Session) -> Result<usize> {
    let Some(blob) = session.dht.chunked_get(contacts_backup_key(&session.fp).as_bytes()).await else {
        return Ok(0);
    };
    let backup: ContactsBackup = serde_json::from_slice(&blob).map_err(|e| EngineError::Internal(e.to_string()))?;
    backup.verify().map_err(|_| EngineError::InvalidSignature)?;

    let mut added = 0;
    for fp_hex in backup.fingerprints {
        if session.contacts.exists(&fp_hex).await? {
            continue;
        }
        if session.contacts.insert(&fp_hex, None, now()).await.is_ok() {
            added += 1;
            if let Ok(fp) = Fingerprint::parse(&fp_hex) {
                session
                    .outbox
                    .listen(session.dht.clone(), session.events.clone(), fp, session.fp)
                    .await?;
                session
                    .delivery
                    .track(session.dht.clone(), fp, session.messages.clone(), session.events.clone())
                    .await;
            }
        }
    }
    Ok(added)
}

// ---------------------------------------------------------------------
// Non-core task kinds (Section 4.10 "Non-core handlers"): groups, wallets,
// presence, and the social feed are out of this engine's scope. Each still
// needs a handler so TaskKind dispatch remains exhaustive.
// ---------------------------------------------------------------------

pub async fn not_implemented<T>() -> Result<T> {
    Err(EngineError::NotImplemented)
}

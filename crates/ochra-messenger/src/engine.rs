//! The engine: process lifecycle, identity loading, and task dispatch
//! (Section 3 "Engine State", 4.4 load sequence, 4.6 republish-on-login,
//! 4.7 listener startup, 4.10 dispatch / C1-C11 orchestration).
//!
//! [`Engine`] owns the process-wide [`crate::task::TaskQueue`] and
//! [`crate::task::WorkerPool`], plus at most one loaded [`Session`] at a
//! time. Loading an identity builds a fresh `Session` — per-identity
//! stores, the C5-C9 facades, a day-rotation ticker — and hands it to every
//! subsequently submitted task as an `Arc`. Business logic itself lives in
//! [`crate::handlers`]; this module is wiring, not behavior.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use ochra_crypto::pq::{DsaKeyPair, KemKeyPair};

use crate::config::MessengerConfig;
use crate::delivery::DeliveryTracker;
use crate::dht::DhtClient;
use crate::events::{EventBus, MessengerEvent};
use crate::fingerprint::Fingerprint;
use crate::handlers::{self, ContactSummary, ProfileUpdate};
use crate::keyserver::{self, Profile, Socials, Wallets};
use crate::outbox::{self, OutboxListenerRegistry};
use crate::profile::ProfileCache;
use crate::sendqueue::MessageSendQueue;
use crate::store::{ContactsDb, MessageStore, ProfileDb};
use crate::task::{self, RequestId, TaskKind, TaskQueue, WorkerPool};
use crate::vault;
use crate::{EngineError, Result};

use ochra_db::queries::messenger_contacts::PendingRequestRow;
use ochra_db::queries::messenger_messages::MessageRow;

/// Broadcast capacity for the process-wide event bus (Section 4.3).
const EVENT_BUS_CAPACITY: usize = 256;

/// Everything that exists only while an identity is loaded: the decrypted
/// key material plus the per-identity C5-C9 facades (Section 3's "Engine
/// State", minus the process-wide task queue, worker pool, and DHT client).
pub struct Session {
    pub(crate) fp: Fingerprint,
    pub(crate) dsa: DsaKeyPair,
    pub(crate) kem: KemKeyPair,
    pub(crate) contacts: Arc<ContactsDb>,
    pub(crate) messages: Arc<MessageStore>,
    pub(crate) profiles: Arc<ProfileCache>,
    pub(crate) dht: Arc<DhtClient>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) send_queue: Arc<MessageSendQueue>,
    pub(crate) outbox: Arc<OutboxListenerRegistry>,
    pub(crate) delivery: Arc<DeliveryTracker>,
    /// Local cache of resolved `name -> fingerprint` lookups, so repeated
    /// `lookup_name` calls for the same handle don't all hit the DHT.
    pub(crate) name_cache: AsyncMutex<HashMap<String, Fingerprint>>,
    pub(crate) registered_name: AsyncMutex<Option<String>>,
    pub(crate) profile_published_at: AtomicU64,
}

fn contacts_db_path(data_dir: &Path, fp: &Fingerprint) -> PathBuf {
    data_dir.join(format!("{}_contacts.db", fp.to_hex()))
}

fn profiles_db_path(data_dir: &Path, fp: &Fingerprint) -> PathBuf {
    data_dir.join(format!("{}_profiles.db", fp.to_hex()))
}

/// Re-publish this identity's own profile if the keyserver doesn't have it
/// yet (Section 4.6). Every failure here is logged and swallowed: a stale
/// or missing remote profile record must never fail identity load.
async fn republish_own_profile_if_missing(session: &Session, recovered_name: Option<&str>, now: u64) {
    match keyserver::lookup(&session.dht, &session.fp).await {
        Ok(profile) => {
            if let Err(err) = session.profiles.store(&session.fp, &profile, now).await {
                warn!(error = %err, "failed to cache own profile after login");
            }
        }
        Err(EngineError::NotFound(_)) => {
            let blank = Profile {
                display_name: recovered_name.map(str::to_string),
                wallets: Wallets::default(),
                socials: Socials::default(),
                bio: None,
                avatar_b64: None,
                dsa_pubkey: session.dsa.public_key.clone(),
                kem_pubkey: session.kem.public_key.clone(),
                timestamp: 0,
                signature: Vec::new(),
            };
            let mut blank = blank;
            blank.sign(&session.dsa, now);
            if let Err(err) = keyserver::publish(&session.dht, &session.fp, recovered_name, &blank, &session.dsa, now).await {
                warn!(error = %err, "failed to republish own profile on login");
            }
        }
        Err(err) => warn!(error = %err, "own profile lookup failed on login"),
    }
}

/// The decentralized messenger orchestration engine (C1-C11).
///
/// Construct one per running identity process: the task queue and worker
/// pool start immediately, before any identity is loaded, and survive
/// across `load_identity`/`unload_identity` cycles.
pub struct Engine {
    data_dir: PathBuf,
    config: MessengerConfig,
    task_queue: Arc<TaskQueue>,
    worker_pool: AsyncMutex<Option<WorkerPool>>,
    dht: Arc<DhtClient>,
    events: Arc<EventBus>,
    session: RwLock<Option<Arc<Session>>>,
    rotation_ticker: AsyncMutex<Option<tokio::task::JoinHandle<()>>>,
    session_password: AsyncMutex<Option<Zeroizing<String>>>,
}

impl Engine {
    /// Build an engine with its own process-wide DHT client.
    pub fn new(data_dir: PathBuf, config: MessengerConfig) -> Self {
        Self::with_dht(data_dir, config, Arc::new(DhtClient::new()))
    }

    /// Build an engine against an externally supplied DHT client. Used in
    /// tests to put two engines on the same simulated network.
    pub fn with_dht(data_dir: PathBuf, config: MessengerConfig, dht: Arc<DhtClient>) -> Self {
        let task_queue = Arc::new(TaskQueue::new());
        let worker_count = config.worker_threads.clamp(task::MIN_WORKERS, task::MAX_WORKERS);
        let worker_pool = WorkerPool::start(worker_count, task_queue.clone());
        info!(workers = worker_count, "messenger engine started");
        Self {
            data_dir,
            config,
            task_queue,
            worker_pool: AsyncMutex::new(Some(worker_pool)),
            dht,
            events: Arc::new(EventBus::new(EVENT_BUS_CAPACITY)),
            session: RwLock::new(None),
            rotation_ticker: AsyncMutex::new(None),
            session_password: AsyncMutex::new(None),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MessengerEvent> {
        self.events.subscribe()
    }

    pub async fn is_identity_loaded(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn loaded_fingerprint(&self) -> Option<Fingerprint> {
        self.session.read().await.as_ref().map(|s| s.fp)
    }

    /// Enumerate identities with key material on disk under the data
    /// directory, regardless of whether one is currently loaded.
    pub async fn list_identities(&self) -> Result<Vec<Fingerprint>> {
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(EngineError::Internal(e.to_string())),
        };
        while let Some(entry) = entries.next_entry().await.map_err(|e| EngineError::Internal(e.to_string()))? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(fp) = Fingerprint::parse(name) else { continue };
            if entry.path().join(format!("{name}.dsa")).exists() {
                out.push(fp);
            }
        }
        Ok(out)
    }

    /// Generate and persist a fresh identity. Does not load it.
    pub fn create_identity(&self, password: Option<&str>) -> Result<Fingerprint> {
        let loaded = vault::create_identity(&self.data_dir, password)?;
        Ok(loaded.fingerprint)
    }

    pub fn change_password(&self, fingerprint: Fingerprint, old_password: Option<&str>, new_password: Option<&str>) -> Result<()> {
        vault::change_password(&self.data_dir, fingerprint, old_password, new_password)
    }

    /// Delete an identity's key material and per-identity databases,
    /// unloading it first if it's the currently active session.
    pub async fn delete_identity(&self, fingerprint: Fingerprint) -> Result<()> {
        if self.loaded_fingerprint().await == Some(fingerprint) {
            self.unload_identity().await?;
        }
        vault::delete_identity_sync(&self.data_dir, &fingerprint.to_hex())
    }

    /// Run the Section 4.4 load sequence: decrypt key material, open the
    /// per-identity stores, start outbox listeners and delivery tracking
    /// for every known contact, poll each for today's offline messages, and
    /// republish this identity's own profile if the keyserver lacks it.
    pub async fn load_identity(&self, fingerprint: Fingerprint, password: Option<&str>) -> Result<()> {
        if self.is_identity_loaded().await {
            self.unload_identity().await?;
        }

        let loaded = vault::load_identity(&self.data_dir, fingerprint, password)?;
        let contacts = Arc::new(ContactsDb::open(&contacts_db_path(&self.data_dir, &fingerprint))?);
        let messages = Arc::new(MessageStore::open(&contacts_db_path(&self.data_dir, &fingerprint))?);
        let profiles = Arc::new(ProfileCache::new(ProfileDb::open(&profiles_db_path(&self.data_dir, &fingerprint))?));

        let session = Arc::new(Session {
            fp: fingerprint,
            dsa: loaded.dsa,
            kem: loaded.kem,
            contacts,
            messages,
            profiles,
            dht: self.dht.clone(),
            events: self.events.clone(),
            send_queue: Arc::new(MessageSendQueue::new(self.config.worker_threads)),
            outbox: Arc::new(OutboxListenerRegistry::new()),
            delivery: Arc::new(DeliveryTracker::new(fingerprint)),
            name_cache: AsyncMutex::new(HashMap::new()),
            registered_name: AsyncMutex::new(None),
            profile_published_at: AtomicU64::new(0),
        });

        if let Err(err) = handlers::sync_contacts_from_dht(&session).await {
            warn!(error = %err, "contacts sync from dht failed during login");
        }

        let known_contacts: Vec<Fingerprint> = session
            .contacts
            .list()
            .await?
            .into_iter()
            .filter_map(|row| Fingerprint::parse(&row.fingerprint).ok())
            .collect();

        if let Err(err) = session
            .outbox
            .listen_all_contacts(session.dht.clone(), session.events.clone(), &known_contacts, fingerprint)
            .await
        {
            warn!(error = %err, "failed to start every outbox listener during login");
        }
        for contact_fp in &known_contacts {
            session
                .delivery
                .track(session.dht.clone(), *contact_fp, session.messages.clone(), session.events.clone())
                .await;
            if let Err(err) = handlers::check_offline_messages(&session, *contact_fp).await {
                debug!(contact = %contact_fp, error = %err, "offline message check found nothing or failed");
            }
        }

        let ticker = outbox::spawn_rotation_ticker(session.outbox.clone(), session.dht.clone(), session.events.clone(), fingerprint);
        *self.rotation_ticker.lock().await = Some(ticker);

        let recovered_name = keyserver::reverse_lookup(&session.dht, &fingerprint).await;
        let now = current_timestamp();
        republish_own_profile_if_missing(&session, recovered_name.as_deref(), now).await;
        *session.registered_name.lock().await = recovered_name;

        *self.session_password.lock().await = password.map(|p| Zeroizing::new(p.to_string()));
        *self.session.write().await = Some(session);

        self.events.emit(MessengerEvent::IdentityLoaded {
            fingerprint: fingerprint.to_hex(),
        });
        info!(fingerprint = %fingerprint, "identity loaded");
        Ok(())
    }

    /// Tear down the active session: cancel every outbox listener and
    /// delivery tracker, stop the rotation ticker, and zero the cached
    /// session password. A no-op if nothing is loaded.
    pub async fn unload_identity(&self) -> Result<()> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };
        session.outbox.cancel_all(&session.dht).await;
        session.delivery.untrack_all(&session.dht).await;
        if let Some(ticker) = self.rotation_ticker.lock().await.take() {
            ticker.abort();
        }
        self.session_password.lock().await.take();
        info!(fingerprint = %session.fp, "identity unloaded");
        Ok(())
    }

    async fn session(&self) -> Result<Arc<Session>> {
        self.session.read().await.clone().ok_or(EngineError::NoIdentity)
    }

    /// Submit a task bound to the active session. `NoIdentity` if nothing
    /// is loaded; `Busy` if the queue is full (Section 4.1).
    pub async fn submit<T, F, Fut>(&self, kind: TaskKind, f: F) -> Result<(RequestId, oneshot::Receiver<Result<T>>)>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let session = self.session().await?;
        let fut = f(session);
        let (handle, rx) = self.task_queue.submit(kind, fut)?;
        Ok((handle.request_id, rx))
    }

    /// Dispatch one of the non-core task kinds (groups, wallets, presence,
    /// social feed): these are out of this engine's scope and always
    /// resolve to [`EngineError::NotImplemented`].
    pub async fn submit_not_implemented(&self, kind: TaskKind) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(kind, |_session| handlers::not_implemented::<()>()).await
    }

    pub async fn get_contacts(&self) -> Result<(RequestId, oneshot::Receiver<Result<Vec<ContactSummary>>>)> {
        self.submit(TaskKind::GetContacts, |s| async move { handlers::get_contacts(&s).await }).await
    }

    pub async fn add_contact(&self, fingerprint: Fingerprint, notes: Option<String>) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::AddContact, |s| async move { handlers::add_contact(&s, fingerprint, notes).await })
            .await
    }

    pub async fn remove_contact(&self, fingerprint: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::RemoveContact, |s| async move { handlers::remove_contact(&s, fingerprint).await })
            .await
    }

    pub async fn block_user(&self, fingerprint: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::BlockUser, |s| async move { handlers::block_user(&s, fingerprint).await }).await
    }

    pub async fn unblock_user(&self, fingerprint: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::UnblockUser, |s| async move { handlers::unblock_user(&s, fingerprint).await })
            .await
    }

    pub async fn get_blocked_users(&self) -> Result<(RequestId, oneshot::Receiver<Result<Vec<ContactSummary>>>)> {
        self.submit(TaskKind::GetBlockedUsers, |s| async move { handlers::get_blocked_users(&s).await })
            .await
    }

    pub async fn send_contact_request(&self, target_fp: Fingerprint, message: Option<String>) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::SendContactRequest, |s| async move {
            handlers::send_contact_request(&s, target_fp, message).await
        })
        .await
    }

    pub async fn get_contact_requests(&self) -> Result<(RequestId, oneshot::Receiver<Result<Vec<PendingRequestRow>>>)> {
        self.submit(TaskKind::GetContactRequests, |s| async move { handlers::get_contact_requests(&s).await })
            .await
    }

    pub async fn approve_contact_request(&self, sender_fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::ApproveContactRequest, |s| async move {
            handlers::approve_contact_request(&s, sender_fp).await
        })
        .await
    }

    pub async fn deny_contact_request(&self, sender_fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::DenyContactRequest, |s| async move { handlers::deny_contact_request(&s, sender_fp).await })
            .await
    }

    pub async fn get_display_name(&self, fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<Option<String>>>)> {
        self.submit(TaskKind::GetDisplayName, |s| async move { handlers::get_display_name(&s, fp).await })
            .await
    }

    pub async fn get_avatar(&self, fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<Option<String>>>)> {
        self.submit(TaskKind::GetAvatar, |s| async move { handlers::get_avatar(&s, fp).await }).await
    }

    pub async fn lookup_name(&self, name: String) -> Result<(RequestId, oneshot::Receiver<Result<Fingerprint>>)> {
        self.submit(TaskKind::LookupName, |s| async move {
            if let Some(cached) = s.name_cache.lock().await.get(&name.to_lowercase()) {
                return Ok(*cached);
            }
            let fp = handlers::lookup_name(&s, name.clone()).await?;
            s.name_cache.lock().await.insert(name.to_lowercase(), fp);
            Ok(fp)
        })
        .await
    }

    pub async fn get_profile(&self, fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<Profile>>)> {
        self.submit(TaskKind::GetProfile, |s| async move { handlers::get_profile(&s, fp).await }).await
    }

    pub async fn lookup_profile(&self, fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<Profile>>)> {
        self.submit(TaskKind::LookupProfile, |s| async move { handlers::lookup_profile(&s, fp).await })
            .await
    }

    pub async fn get_registered_name(&self) -> Result<(RequestId, oneshot::Receiver<Result<Option<String>>>)> {
        self.submit(TaskKind::GetRegisteredName, |s| async move { handlers::get_registered_name(&s).await })
            .await
    }

    pub async fn register_name(&self, name: String) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::RegisterName, |s| async move { handlers::register_name(&s, name).await })
            .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::UpdateProfile, |s| async move { handlers::update_profile(&s, update).await })
            .await
    }

    /// Queue an outbound message for fire-and-forget delivery (Section 4.9
    /// / C9): returns the allocated send-queue slot id immediately, with no
    /// completion callback.
    pub async fn send_message(&self, recipient_fp: Fingerprint, plaintext: Vec<u8>) -> Result<u64> {
        let session = self.session().await?;
        let send_queue = session.send_queue.clone();
        let task_queue = self.task_queue.clone();
        let session_for_send = session.clone();
        send_queue
            .queue_message(&task_queue, recipient_fp, plaintext, move |recipient, text| async move {
                match handlers::send_message(&session_for_send, recipient, text).await {
                    Ok(seq) => {
                        session_for_send.events.emit(MessengerEvent::message_sent(recipient, seq));
                    }
                    Err(err) => warn!(recipient = %recipient, error = %err, "queued send failed"),
                }
            })
            .await
    }

    pub async fn get_conversation(&self, peer_fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<Vec<MessageRow>>>)> {
        self.submit(TaskKind::GetConversation, |s| async move { handlers::get_conversation(&s, peer_fp).await })
            .await
    }

    pub async fn check_offline_messages(&self, contact_fp: Fingerprint) -> Result<(RequestId, oneshot::Receiver<Result<usize>>)> {
        self.submit(TaskKind::CheckOfflineMessages, |s| async move {
            handlers::check_offline_messages(&s, contact_fp).await
        })
        .await
    }

    pub async fn sync_contacts_to_dht(&self) -> Result<(RequestId, oneshot::Receiver<Result<()>>)> {
        self.submit(TaskKind::SyncContactsToDht, |s| async move { handlers::sync_contacts_to_dht(&s).await })
            .await
    }

    pub async fn sync_contacts_from_dht(&self) -> Result<(RequestId, oneshot::Receiver<Result<usize>>)> {
        self.submit(TaskKind::SyncContactsFromDht, |s| async move { handlers::sync_contacts_from_dht(&s).await })
            .await
    }

    /// Stop accepting work: unload the active identity and drain the
    /// worker pool. Idempotent.
    pub async fn shutdown(&self) {
        if let Err(err) = self.unload_identity().await {
            warn!(error = %err, "error unloading identity during shutdown");
        }
        if let Some(pool) = self.worker_pool.lock().await.take() {
            pool.shutdown().await;
        }
        info!("messenger engine shut down");
    }
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tmp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("ochra-messenger-engine-test-{}", std::process::id()));
        dir.push(uuid_like());
        dir
    }

    fn uuid_like() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    #[tokio::test]
    async fn test_create_and_load_identity() {
        let dir = tmp_dir();
        let engine = Engine::new(dir, MessengerConfig::default());
        let fp = engine.create_identity(None).expect("create");
        assert!(engine.list_identities().await.expect("list").contains(&fp));

        engine.load_identity(fp, None).await.expect("load");
        assert!(engine.is_identity_loaded().await);
        assert_eq!(engine.loaded_fingerprint().await, Some(fp));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_load_wrong_password_rejected() {
        let dir = tmp_dir();
        let engine = Engine::new(dir, MessengerConfig::default());
        let fp = engine.create_identity(Some("correct horse")).expect("create");
        let err = engine.load_identity(fp, Some("wrong password")).await.unwrap_err();
        assert!(matches!(err, EngineError::WrongPassword));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_without_loaded_identity_fails() {
        let dir = tmp_dir();
        let engine = Engine::new(dir, MessengerConfig::default());
        let err = engine.get_contacts().await.unwrap_err();
        assert!(matches!(err, EngineError::NoIdentity));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_add_contact_and_get_contacts_round_trip() {
        let dir = tmp_dir();
        let engine = Engine::new(dir, MessengerConfig::default());
        let fp = engine.create_identity(None).expect("create");
        engine.load_identity(fp, None).await.expect("load");

        let bob_dsa = DsaKeyPair::generate();
        let bob_fp = Fingerprint::from_dsa_public_key(&bob_dsa.public_key);

        let (_, rx) = engine.add_contact(bob_fp, Some("friend".into())).await.expect("submit add");
        rx.await.expect("recv").expect("add ok");

        let (_, rx) = engine.get_contacts().await.expect("submit get");
        let contacts = rx.await.expect("recv").expect("get ok");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].fingerprint, bob_fp.to_hex());
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_message_round_trip_between_two_engines() {
        let shared_dht = Arc::new(DhtClient::new());

        let alice_engine = Engine::with_dht(tmp_dir(), MessengerConfig::default(), shared_dht.clone());
        let alice_fp = alice_engine.create_identity(None).expect("create alice");
        alice_engine.load_identity(alice_fp, None).await.expect("load alice");

        let bob_engine = Engine::with_dht(tmp_dir(), MessengerConfig::default(), shared_dht.clone());
        let bob_fp = bob_engine.create_identity(None).expect("create bob");
        bob_engine.load_identity(bob_fp, None).await.expect("load bob");

        let (_, rx) = bob_engine
            .update_profile(ProfileUpdate {
                display_name: Some("Bob".into()),
                ..Default::default()
            })
            .await
            .expect("submit update");
        rx.await.expect("recv").expect("update ok");

        alice_engine.send_message(bob_fp, b"hello bob".to_vec()).await.expect("queue send");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (_, rx) = bob_engine.check_offline_messages(alice_fp).await.expect("submit check");
        let received = rx.await.expect("recv").expect("check ok");
        assert_eq!(received, 1);

        let (_, rx) = bob_engine.get_conversation(alice_fp).await.expect("submit conversation");
        let convo = rx.await.expect("recv").expect("conversation ok");
        assert_eq!(convo[0].plaintext, b"hello bob");

        alice_engine.shutdown().await;
        bob_engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_unload_then_delete_identity() {
        let dir = tmp_dir();
        let engine = Engine::new(dir, MessengerConfig::default());
        let fp = engine.create_identity(None).expect("create");
        engine.load_identity(fp, None).await.expect("load");

        engine.delete_identity(fp).await.expect("delete");
        assert!(!engine.is_identity_loaded().await);
        assert!(!engine.list_identities().await.expect("list").contains(&fp));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_register_name_recovered_after_reload() {
        let shared_dht = Arc::new(DhtClient::new());
        let dir = tmp_dir();

        let engine = Engine::with_dht(dir.clone(), MessengerConfig::default(), shared_dht.clone());
        let fp = engine.create_identity(None).expect("create");
        engine.load_identity(fp, None).await.expect("load");
        let (_, rx) = engine.register_name("Carol".into()).await.expect("submit register");
        rx.await.expect("recv").expect("register ok");
        engine.unload_identity().await.expect("unload");

        engine.load_identity(fp, None).await.expect("reload");
        let (_, rx) = engine.get_registered_name().await.expect("submit get name");
        let name = rx.await.expect("recv").expect("get ok");
        assert_eq!(name, Some("carol".into()));
        engine.shutdown().await;
    }
}

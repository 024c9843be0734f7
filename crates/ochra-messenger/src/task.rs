//! The task queue, worker pool, and the closed task-type set (Section 4.1,
//! 4.2, 4.10 / C1, C2, C10).
//!
//! *Ambient realization (SPEC_FULL.md 1.1, 4.1, 4.2):* the spec's
//! "bounded ring + condvar" becomes a `tokio::sync::mpsc::channel(256)`
//! guarded by the channel's own backpressure, and its "N worker threads"
//! become `tokio::task::spawn`ed workers. `submit` is generic over the
//! task's output type (Section 6's "Ambient realization"): a submitted
//! task is a boxed, type-erased future that already closes over its own
//! `oneshot::Sender<Result<T>>`, so the queue itself only ever stores one
//! homogeneous item type regardless of what each task returns. [`TaskKind`]
//! remains a plain tagged discriminator — the closed task-type set — used
//! for logging, cancellation bookkeeping, and the "exactly one completion
//! of this kind" assertions in Section 8's test scenarios.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};

use crate::{EngineError, Result};

/// Ring capacity (Section 4.1: "capacity is a compile-time constant; 256 is
/// sufficient").
pub const QUEUE_CAPACITY: usize = 256;

/// Worker pool sizing bounds (Section 4.2).
pub const MIN_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 24;

pub type RequestId = u64;

/// The closed task-type set (Section 4.10). Handlers for the entries after
/// `CheckOfflineMessages` are thin, non-core delegating stubs (Section
/// 4.10's "Non-core handlers" clarification); they exist so dispatch stays
/// exhaustive rather than falling back to an open string method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    ListIdentities,
    CreateIdentity,
    LoadIdentity,
    RegisterName,
    GetDisplayName,
    GetAvatar,
    LookupName,
    GetProfile,
    LookupProfile,
    UpdateProfile,
    GetContacts,
    AddContact,
    RemoveContact,
    SendContactRequest,
    GetContactRequests,
    ApproveContactRequest,
    DenyContactRequest,
    BlockUser,
    UnblockUser,
    GetBlockedUsers,
    SendMessage,
    GetConversation,
    CheckOfflineMessages,
    GetGroups,
    CreateGroup,
    SendGroupMessage,
    GetInvitations,
    AcceptInvitation,
    RejectInvitation,
    ListWallets,
    GetBalances,
    SendTokens,
    GetTransactions,
    RefreshPresence,
    LookupPresence,
    SyncContactsToDht,
    SyncContactsFromDht,
    SyncGroups,
    GetRegisteredName,
    GetFeedPosts,
    CreateFeedPost,
    AddFeedComment,
    CastFeedVote,
    GetFeedVotes,
    CastCommentVote,
    GetCommentVotes,
}

impl TaskKind {
    /// Whether this kind is handled by CORE business logic, as opposed to a
    /// delegating stub for an out-of-core collaborator.
    pub fn is_core(self) -> bool {
        !matches!(
            self,
            TaskKind::GetGroups
                | TaskKind::CreateGroup
                | TaskKind::SendGroupMessage
                | TaskKind::GetInvitations
                | TaskKind::AcceptInvitation
                | TaskKind::RejectInvitation
                | TaskKind::ListWallets
                | TaskKind::GetBalances
                | TaskKind::SendTokens
                | TaskKind::GetTransactions
                | TaskKind::RefreshPresence
                | TaskKind::LookupPresence
                | TaskKind::SyncGroups
                | TaskKind::GetFeedPosts
                | TaskKind::CreateFeedPost
                | TaskKind::AddFeedComment
                | TaskKind::CastFeedVote
                | TaskKind::GetFeedVotes
                | TaskKind::CastCommentVote
                | TaskKind::GetCommentVotes
        )
    }
}

/// A queued unit of work: a type-erased future plus the bookkeeping the
/// worker pool needs to honor cancellation and the closed task-type set.
pub struct TaskRecord {
    pub request_id: RequestId,
    pub kind: TaskKind,
    cancelled: Arc<AtomicBool>,
    run: Pin<Box<dyn Future<Output = ()> + Send>>,
}

/// A handle to a submitted task, returned alongside its `oneshot::Receiver`.
/// Dropping this handle does not cancel the task; call [`TaskHandle::cancel`]
/// explicitly.
#[derive(Clone)]
pub struct TaskHandle {
    pub request_id: RequestId,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Mark this task cancelled. If the worker pool has not yet dispatched
    /// it, it is dropped without invoking its callback (Section 4.2, 8).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Bounded MPSC ring of [`TaskRecord`]s (C1).
pub struct TaskQueue {
    sender: mpsc::Sender<TaskRecord>,
    receiver: Mutex<mpsc::Receiver<TaskRecord>>,
    next_request_id: AtomicU64,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            // Request ids are monotonic and never 0 (Section 3 invariants).
            next_request_id: AtomicU64::new(1),
        }
    }

    fn allocate_request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Build and enqueue a task whose output is `T`, returning its handle and
    /// a receiver for the completion. `push` (the ring's enqueue operation)
    /// fails when the ring is full; the caller is handed back an error
    /// rather than a request id, matching Section 4.1's back-pressure
    /// signal without reusing 0 as a sentinel.
    pub fn submit<T, F>(&self, kind: TaskKind, fut: F) -> Result<(TaskHandle, oneshot::Receiver<Result<T>>)>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let request_id = self.allocate_request_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let run: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
            let outcome = fut.await;
            let _ = tx.send(outcome);
        });
        let record = TaskRecord {
            request_id,
            kind,
            cancelled: cancelled.clone(),
            run,
        };
        self.sender
            .try_send(record)
            .map_err(|_| EngineError::Busy)?;
        Ok((TaskHandle { request_id, cancelled }, rx))
    }

    /// Like [`Self::submit`], but the task's completion is never awaited by
    /// the caller (Section 4.9's "no callback" send-queue tasks): the future
    /// must perform its own cleanup (e.g. releasing a send-queue slot)
    /// before it resolves.
    pub fn submit_fire_and_forget<F>(&self, kind: TaskKind, fut: F) -> Result<TaskHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let request_id = self.allocate_request_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let record = TaskRecord {
            request_id,
            kind,
            cancelled: cancelled.clone(),
            run: Box::pin(fut),
        };
        self.sender
            .try_send(record)
            .map_err(|_| EngineError::Busy)?;
        Ok(TaskHandle { request_id, cancelled })
    }

    /// Pop the next task, blocking (awaiting) while the queue is empty.
    /// Returns `None` once every sender has been dropped (shutdown).
    async fn pop(&self) -> Option<TaskRecord> {
        self.receiver.lock().await.recv().await
    }

    pub fn is_empty(&self) -> bool {
        self.sender.capacity() == QUEUE_CAPACITY
    }
}

/// N worker tasks draining a [`TaskQueue`] (C2).
pub struct WorkerPool {
    workers: Vec<tokio::task::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

/// Number of workers to start, clamped to `[MIN_WORKERS, MAX_WORKERS]` based
/// on the host's logical CPU count (Section 4.2).
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

impl WorkerPool {
    /// Start `worker_count` workers draining `queue`. Cancelled tasks are
    /// dropped without running their future (Section 4.2).
    pub fn start(worker_count: usize, queue: Arc<TaskQueue>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    match queue.pop().await {
                        Some(task) => {
                            if !task.cancelled.load(Ordering::SeqCst) {
                                task.run.await;
                            }
                        }
                        None => break,
                    }
                }
            }));
        }
        Self { workers, shutdown }
    }

    /// Signal shutdown and join every worker.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_and_dispatch_runs_exactly_once() {
        let queue = Arc::new(TaskQueue::new());
        let count = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::start(4, queue.clone());

        let count2 = count.clone();
        let (_, rx) = queue
            .submit(TaskKind::GetContacts, async move {
                count2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, EngineError>(())
            })
            .expect("submit");

        rx.await.expect("completion").expect("ok");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_task_never_runs() {
        let queue = Arc::new(TaskQueue::new());
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = count.clone();
        let (handle, rx) = queue
            .submit(TaskKind::GetContacts, async move {
                count2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, EngineError>(())
            })
            .expect("submit");
        handle.cancel();

        let pool = WorkerPool::start(4, queue.clone());
        // Give the worker a chance to observe the cancellation before the
        // queue shuts down; the receiver is simply never resolved.
        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.shutdown().await;
        drop(rx);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_queue_full_returns_busy() {
        let queue = Arc::new(TaskQueue::new());
        for _ in 0..QUEUE_CAPACITY {
            queue
                .submit(TaskKind::GetContacts, async { Ok::<_, EngineError>(()) })
                .expect("submit");
        }
        let err = queue
            .submit(TaskKind::GetContacts, async { Ok::<_, EngineError>(()) })
            .unwrap_err();
        assert!(matches!(err, EngineError::Busy));
    }

    #[tokio::test]
    async fn test_request_ids_are_monotonic_and_nonzero() {
        let queue = Arc::new(TaskQueue::new());
        let (h1, _) = queue
            .submit(TaskKind::GetContacts, async { Ok::<_, EngineError>(()) })
            .expect("submit");
        let (h2, _) = queue
            .submit(TaskKind::GetContacts, async { Ok::<_, EngineError>(()) })
            .expect("submit");
        assert!(h1.request_id != 0);
        assert!(h2.request_id > h1.request_id);
    }

    #[tokio::test]
    async fn test_fire_and_forget_runs_without_receiver() {
        let queue = Arc::new(TaskQueue::new());
        let count = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::start(4, queue.clone());

        let count2 = count.clone();
        queue
            .submit_fire_and_forget(TaskKind::SendMessage, async move {
                count2.fetch_add(1, Ordering::SeqCst);
            })
            .expect("submit");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        pool.shutdown().await;
    }

    #[test]
    fn test_default_worker_count_in_range() {
        let n = default_worker_count();
        assert!(n >= MIN_WORKERS && n <= MAX_WORKERS);
    }
}

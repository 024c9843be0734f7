//! Fire-and-forget outbound message queue (Section 4.9 / C9).
//!
//! A `queue_message` call allocates a monotonic slot id, submits a
//! [`crate::task::TaskKind::SendMessage`] task with no completion callback
//! (Section 4.9: "no callback"), and releases the slot once that task
//! finishes, success or failure. Capacity is dynamic but bounded by
//! [`MAX_CAPACITY`]; [`MessageSendQueue::set_capacity`] refuses to shrink
//! below the current occupancy.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::fingerprint::Fingerprint;
use crate::task::{TaskKind, TaskQueue};
use crate::{EngineError, Result};

/// Hard cap on simultaneously queued sends (Section 4.9).
pub const MAX_CAPACITY: usize = 100;

/// Default capacity a freshly constructed queue starts with.
pub const DEFAULT_CAPACITY: usize = 32;

struct State {
    capacity: usize,
    occupied: HashSet<u64>,
}

pub struct MessageSendQueue {
    state: Mutex<State>,
    next_slot_id: AtomicU64,
}

impl Default for MessageSendQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MessageSendQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                capacity: capacity.clamp(1, MAX_CAPACITY),
                occupied: HashSet::new(),
            }),
            // Slot ids are monotonic and never 0.
            next_slot_id: AtomicU64::new(1),
        }
    }

    /// Reserve a slot, submit the send as a fire-and-forget task, and
    /// release the slot once `send` resolves regardless of outcome.
    /// Returns the allocated slot id, or `Busy` if every slot is occupied.
    pub async fn queue_message<F, Fut>(
        self: &Arc<Self>,
        task_queue: &TaskQueue,
        recipient_fp: Fingerprint,
        plaintext: Vec<u8>,
        send: F,
    ) -> Result<u64>
    where
        F: FnOnce(Fingerprint, Vec<u8>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let slot_id = {
            let mut state = self.state.lock().await;
            if state.occupied.len() >= state.capacity {
                return Err(EngineError::Busy);
            }
            let id = self.next_slot_id.fetch_add(1, Ordering::SeqCst);
            state.occupied.insert(id);
            id
        };

        let queue = self.clone();
        task_queue.submit_fire_and_forget(TaskKind::SendMessage, async move {
            send(recipient_fp, plaintext).await;
            queue.release(slot_id).await;
        })?;

        Ok(slot_id)
    }

    async fn release(&self, slot_id: u64) {
        self.state.lock().await.occupied.remove(&slot_id);
    }

    pub async fn occupied_count(&self) -> usize {
        self.state.lock().await.occupied.len()
    }

    pub async fn capacity(&self) -> usize {
        self.state.lock().await.capacity
    }

    pub async fn is_occupied(&self, slot_id: u64) -> bool {
        self.state.lock().await.occupied.contains(&slot_id)
    }

    /// Change capacity to `n`, clamped to `[1, MAX_CAPACITY]`. Refuses to
    /// drop below the number of currently occupied slots.
    pub async fn set_capacity(&self, n: usize) -> Result<()> {
        if n == 0 || n > MAX_CAPACITY {
            return Err(EngineError::InvalidArg(format!(
                "send queue capacity must be within 1..={MAX_CAPACITY}"
            )));
        }
        let mut state = self.state.lock().await;
        if n < state.occupied.len() {
            return Err(EngineError::InvalidArg(
                "cannot shrink send queue capacity below current occupancy".into(),
            ));
        }
        state.capacity = n;
        Ok(())
    }
}

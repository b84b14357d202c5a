//! Registry of clients parked on BLPOP, BRPOP and XREAD BLOCK.
//!
//! The coordinator lives inside the [`KeyValueStore`] so that registering,
//! serving and cancelling all happen under the single store lock. Writes
//! only mark a key as ready; the dispatcher calls
//! [`KeyValueStore::serve_blocked_clients`] once the command (or the whole
//! transaction) has finished, so a waiter never observes a half-applied
//! batch.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use bytes::Bytes;
use tokio::{
    sync::{Mutex, oneshot},
    time::{Instant, timeout_at},
};

use crate::key_value_store::KeyValueStore;

pub type ClientId = u64;
pub type WaiterId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    ListPop(ListSide),
    StreamRead,
}

/// What a parked client receives when it is served.
#[derive(Debug, Clone, PartialEq)]
pub enum Wakeup {
    /// The element was already removed from the list on the client's behalf.
    Popped { key: Bytes, element: Bytes },
    /// New entries were appended; the client re-reads the stream itself.
    StreamAppended { key: Bytes },
}

#[derive(Debug)]
pub struct Waiter {
    pub client_id: ClientId,
    pub keys: Vec<Bytes>,
    pub kind: WaitKind,
    sender: oneshot::Sender<Wakeup>,
}

impl Waiter {
    /// Hands the wakeup over. Gives it back when the client stopped waiting.
    pub fn wake(self, wakeup: Wakeup) -> Result<(), Wakeup> {
        self.sender.send(wakeup)
    }
}

#[derive(Debug, Default)]
pub struct BlockingCoordinator {
    next_waiter_id: WaiterId,
    waiters: HashMap<WaiterId, Waiter>,
    queues: HashMap<Bytes, VecDeque<WaiterId>>,
    ready_keys: VecDeque<Bytes>,
    ready_set: HashSet<Bytes>,
}

impl BlockingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a client on `keys`. The receiver resolves at most once.
    pub fn register(
        &mut self,
        client_id: ClientId,
        keys: Vec<Bytes>,
        kind: WaitKind,
    ) -> (WaiterId, oneshot::Receiver<Wakeup>) {
        let (sender, receiver) = oneshot::channel();
        let waiter_id = self.next_waiter_id;
        self.next_waiter_id += 1;

        for key in &keys {
            let queue = self.queues.entry(key.clone()).or_default();
            if !queue.contains(&waiter_id) {
                queue.push_back(waiter_id);
            }
        }

        self.waiters.insert(
            waiter_id,
            Waiter {
                client_id,
                keys,
                kind,
                sender,
            },
        );

        (waiter_id, receiver)
    }

    /// Marks `key` as worth serving. Keys nobody waits on are ignored.
    pub fn signal_key_ready(&mut self, key: &Bytes) {
        if !self.queues.contains_key(key) || self.ready_set.contains(key) {
            return;
        }

        self.ready_set.insert(key.clone());
        self.ready_keys.push_back(key.clone());
    }

    pub fn next_ready_key(&mut self) -> Option<Bytes> {
        let key = self.ready_keys.pop_front()?;
        self.ready_set.remove(&key);

        Some(key)
    }

    /// Removes and returns the longest-waiting client on `key` whose kind matches.
    pub fn take_waiter(&mut self, key: &Bytes, matches: impl Fn(WaitKind) -> bool) -> Option<Waiter> {
        let waiter_id = self
            .queues
            .get(key)?
            .iter()
            .copied()
            .find(|waiter_id| {
                self.waiters
                    .get(waiter_id)
                    .is_some_and(|waiter| matches(waiter.kind))
            })?;

        self.remove(waiter_id)
    }

    /// Drops a registration, e.g. after a timeout. Returns `false` when the
    /// waiter was already served or cancelled.
    pub fn cancel(&mut self, waiter_id: WaiterId) -> bool {
        self.remove(waiter_id).is_some()
    }

    /// Drops every registration owned by a disconnecting client.
    pub fn cancel_client(&mut self, client_id: ClientId) -> usize {
        let waiter_ids: Vec<WaiterId> = self
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.client_id == client_id)
            .map(|(waiter_id, _)| *waiter_id)
            .collect();

        waiter_ids
            .into_iter()
            .filter(|waiter_id| self.cancel(*waiter_id))
            .count()
    }

    pub fn blocked_clients(&self) -> usize {
        self.waiters.len()
    }

    pub fn waiters_on(&self, key: &[u8]) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    fn remove(&mut self, waiter_id: WaiterId) -> Option<Waiter> {
        let waiter = self.waiters.remove(&waiter_id)?;

        for key in &waiter.keys {
            if let Some(queue) = self.queues.get_mut(key) {
                queue.retain(|id| *id != waiter_id);

                if queue.is_empty() {
                    self.queues.remove(key);
                }
            }
        }

        Some(waiter)
    }
}

/// Waits for a registered waiter to be served, giving up at `deadline`.
///
/// On timeout the registration is cancelled under the store lock. If a
/// wakeup raced in before the cancel it is still returned, so a popped
/// element is never lost.
pub async fn wait_for_wakeup(
    store: &Arc<Mutex<KeyValueStore>>,
    waiter_id: WaiterId,
    mut receiver: oneshot::Receiver<Wakeup>,
    deadline: Option<Instant>,
) -> Option<Wakeup> {
    let result = match deadline {
        Some(deadline) => match timeout_at(deadline, &mut receiver).await {
            Ok(result) => result,
            Err(_) => {
                let mut store_guard = store.lock().await;
                store_guard.blocking_mut().cancel(waiter_id);
                drop(store_guard);

                return receiver.try_recv().ok();
            }
        },
        None => (&mut receiver).await,
    };

    result.ok()
}

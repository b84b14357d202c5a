//! The shared keyspace: typed values, lazy expiry and change notification.

pub mod sorted_set;
pub mod stream;

use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use globset::GlobMatcher;
use thiserror::Error;
use tokio::{sync::broadcast, time::Instant};
use tracing::trace;

use crate::blocking::{BlockingCoordinator, ListSide, WaitKind, Wakeup};

pub use sorted_set::{ScoreBound, SortedSet};
pub use stream::{Stream, StreamEntry, StreamId, StreamIdRequest};

const MUTATION_FEED_CAPACITY: usize = 1024;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
    SortedSet(SortedSet),
}

impl DataType {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
            DataType::SortedSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ttl {
    Missing,
    NoExpiry,
    Remaining(Duration),
}

/// A key as handed to a persistence layer. Expiry is wall-clock so it
/// survives a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRecord {
    pub key: Bytes,
    pub data: DataType,
    pub expires_at: Option<SystemTime>,
}

#[derive(Debug)]
pub struct KeyValueStore {
    entries: HashMap<Bytes, Value>,
    blocking: BlockingCoordinator,
    mutation_feed: broadcast::Sender<Vec<Bytes>>,
    /// Bumped by every operation that modified the keyspace.
    changes: u64,
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore {
    pub fn new() -> Self {
        let (mutation_feed, _) = broadcast::channel(MUTATION_FEED_CAPACITY);

        Self {
            entries: HashMap::new(),
            blocking: BlockingCoordinator::new(),
            mutation_feed,
            changes: 0,
        }
    }

    pub fn blocking(&self) -> &BlockingCoordinator {
        &self.blocking
    }

    pub fn blocking_mut(&mut self) -> &mut BlockingCoordinator {
        &mut self.blocking
    }

    /// Number of modifications so far. Comparing two readings tells whether
    /// a command changed anything.
    pub fn changes(&self) -> u64 {
        self.changes
    }

    fn mark_changed(&mut self) {
        self.changes = self.changes.wrapping_add(1);
    }

    fn expire_if_needed(&mut self, key: &[u8]) {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(Instant::now()))
        {
            trace!(key = %String::from_utf8_lossy(key), "lazily expired key");
            self.entries.remove(key);
        }
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.expire_if_needed(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.expire_if_needed(key);
        self.entries.get_mut(key)
    }

    /// Stores `data` under `key`, replacing any previous value and its expiry.
    pub fn set(&mut self, key: Bytes, data: DataType, expiration: Option<Instant>) {
        let wakes_waiters = matches!(data, DataType::List(_) | DataType::Stream(_));

        self.entries
            .insert(key.clone(), Value { data, expiration });
        self.mark_changed();

        if wakes_waiters {
            self.blocking.signal_key_ready(&key);
        }
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.expire_if_needed(key);

        let deleted = self.entries.remove(key).is_some();
        if deleted {
            self.mark_changed();
        }

        deleted
    }

    pub fn exists(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Sets an absolute deadline. A deadline in the past deletes the key.
    pub fn set_expiration(&mut self, key: &[u8], expiration: Instant) -> bool {
        let Some(value) = self.get_mut(key) else {
            return false;
        };

        if expiration <= Instant::now() {
            self.entries.remove(key);
        } else {
            value.expiration = Some(expiration);
        }
        self.mark_changed();

        true
    }

    /// Removes the expiry. Returns `false` when the key is missing or had none.
    pub fn persist(&mut self, key: &[u8]) -> bool {
        let persisted = self
            .get_mut(key)
            .and_then(|value| value.expiration.take())
            .is_some();
        if persisted {
            self.mark_changed();
        }

        persisted
    }

    pub fn ttl(&mut self, key: &[u8]) -> Ttl {
        match self.get(key) {
            None => Ttl::Missing,
            Some(Value {
                expiration: None, ..
            }) => Ttl::NoExpiry,
            Some(Value {
                expiration: Some(expiration),
                ..
            }) => Ttl::Remaining(expiration.saturating_duration_since(Instant::now())),
        }
    }

    /// Live keys matching `pattern`, sorted.
    pub fn keys(&mut self, pattern: &GlobMatcher) -> Vec<Bytes> {
        self.remove_expired();

        let mut keys: Vec<Bytes> = self
            .entries
            .keys()
            .filter(|key| pattern.is_match(&*String::from_utf8_lossy(key)))
            .cloned()
            .collect();
        keys.sort();

        keys
    }

    /// Number of keys, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every key whose deadline has passed. Returns how many were removed.
    pub fn remove_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, value| !value.is_expired(now));

        before - self.entries.len()
    }

    pub fn get_string(&mut self, key: &[u8]) -> Result<Option<&Bytes>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(data),
                ..
            }) => Ok(Some(data)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn get_list(&mut self, key: &[u8]) -> Result<Option<&VecDeque<Bytes>>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn get_list_mut_or_create(
        &mut self,
        key: &Bytes,
    ) -> Result<&mut VecDeque<Bytes>, StoreError> {
        self.expire_if_needed(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::List(VecDeque::new())));

        match &mut value.data {
            DataType::List(list) => Ok(list),
            _ => Err(StoreError::WrongType),
        }
    }

    pub fn get_stream(&mut self, key: &[u8]) -> Result<Option<&Stream>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn get_stream_mut_or_create(&mut self, key: &Bytes) -> Result<&mut Stream, StoreError> {
        self.expire_if_needed(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::Stream(Stream::new())));

        match &mut value.data {
            DataType::Stream(stream) => Ok(stream),
            _ => Err(StoreError::WrongType),
        }
    }

    pub fn get_sorted_set(&mut self, key: &[u8]) -> Result<Option<&SortedSet>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::SortedSet(sorted_set),
                ..
            }) => Ok(Some(sorted_set)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn get_sorted_set_mut_or_create(
        &mut self,
        key: &Bytes,
    ) -> Result<&mut SortedSet, StoreError> {
        self.expire_if_needed(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::SortedSet(SortedSet::new())));

        match &mut value.data {
            DataType::SortedSet(sorted_set) => Ok(sorted_set),
            _ => Err(StoreError::WrongType),
        }
    }

    /// Pushes `elements` one by one onto the given end. Returns the new length.
    pub fn push_to_list(
        &mut self,
        key: &Bytes,
        elements: Vec<Bytes>,
        side: ListSide,
    ) -> Result<usize, StoreError> {
        let list = self.get_list_mut_or_create(key)?;

        for element in elements {
            match side {
                ListSide::Left => list.push_front(element),
                ListSide::Right => list.push_back(element),
            }
        }
        let length = list.len();

        self.mark_changed();
        self.blocking.signal_key_ready(key);

        Ok(length)
    }

    /// Pops up to `count` elements. An emptied list is deleted.
    pub fn pop_from_list(
        &mut self,
        key: &[u8],
        count: usize,
        side: ListSide,
    ) -> Result<Vec<Bytes>, StoreError> {
        let Some(value) = self.get_mut(key) else {
            return Ok(Vec::new());
        };

        let DataType::List(list) = &mut value.data else {
            return Err(StoreError::WrongType);
        };

        let popped: Vec<Bytes> = match side {
            ListSide::Left => list.drain(..count.min(list.len())).collect(),
            ListSide::Right => {
                let keep = list.len().saturating_sub(count);
                list.drain(keep..).rev().collect()
            }
        };

        if list.is_empty() {
            self.entries.remove(key);
        }
        if !popped.is_empty() {
            self.mark_changed();
        }

        Ok(popped)
    }

    pub fn append_to_stream(
        &mut self,
        key: &Bytes,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, StoreError> {
        let existed = self.exists(key);
        let stream = self.get_stream_mut_or_create(key)?;

        let id = match stream.append(request, fields, now_ms) {
            Ok(id) => id,
            Err(error) => {
                if !existed {
                    self.entries.remove(key.as_ref());
                }
                return Err(error);
            }
        };

        self.mark_changed();
        self.blocking.signal_key_ready(key);

        Ok(id)
    }

    /// Removes members from a sorted set. An emptied set is deleted.
    pub fn remove_from_sorted_set(
        &mut self,
        key: &[u8],
        members: &[Bytes],
    ) -> Result<usize, StoreError> {
        let Some(value) = self.get_mut(key) else {
            return Ok(0);
        };

        let DataType::SortedSet(sorted_set) = &mut value.data else {
            return Err(StoreError::WrongType);
        };

        let removed = members
            .iter()
            .filter(|member| sorted_set.remove(member))
            .count();

        if sorted_set.is_empty() {
            self.entries.remove(key);
        }
        if removed > 0 {
            self.mark_changed();
        }

        Ok(removed)
    }

    /// Adds members or updates their scores. Returns how many were new.
    pub fn add_to_sorted_set(
        &mut self,
        key: &Bytes,
        members: Vec<(f64, Bytes)>,
    ) -> Result<usize, StoreError> {
        let sorted_set = self.get_sorted_set_mut_or_create(key)?;
        let mut added = 0;
        let mut changed = false;

        for (score, member) in members {
            let previous = sorted_set.score(&member);
            if sorted_set.add(member, score) {
                added += 1;
            }
            changed |= previous != Some(score);
        }

        if changed {
            self.mark_changed();
        }

        Ok(added)
    }

    /// Serves clients parked on keys that became ready since the last call.
    ///
    /// List waiters are served first come first served, each receiving one
    /// popped element; stream waiters on an appended stream are all woken.
    pub fn serve_blocked_clients(&mut self) {
        while let Some(key) = self.blocking.next_ready_key() {
            self.expire_if_needed(&key);

            match self.entries.get(&key).map(|value| &value.data) {
                Some(DataType::List(_)) => self.serve_list_waiters(&key),
                Some(DataType::Stream(_)) => {
                    while let Some(waiter) = self
                        .blocking
                        .take_waiter(&key, |kind| kind == WaitKind::StreamRead)
                    {
                        let _ = waiter.wake(Wakeup::StreamAppended { key: key.clone() });
                    }
                }
                _ => {}
            }
        }
    }

    fn serve_list_waiters(&mut self, key: &Bytes) {
        loop {
            let Some(Value {
                data: DataType::List(list),
                ..
            }) = self.entries.get_mut(key)
            else {
                return;
            };

            if list.is_empty() {
                self.entries.remove(key);
                return;
            }

            let Some(waiter) = self
                .blocking
                .take_waiter(key, |kind| matches!(kind, WaitKind::ListPop(_)))
            else {
                return;
            };

            let WaitKind::ListPop(side) = waiter.kind else {
                continue;
            };

            let element = match side {
                ListSide::Left => list.pop_front(),
                ListSide::Right => list.pop_back(),
            };
            let Some(element) = element else {
                return;
            };

            let wakeup = Wakeup::Popped {
                key: key.clone(),
                element,
            };

            match waiter.wake(wakeup) {
                Ok(()) => {
                    self.changes = self.changes.wrapping_add(1);
                    let command = match side {
                        ListSide::Left => "LPOP",
                        ListSide::Right => "RPOP",
                    };
                    publish_mutation(
                        &self.mutation_feed,
                        vec![Bytes::from_static(command.as_bytes()), key.clone()],
                    );
                }
                Err(Wakeup::Popped { element, .. }) => match side {
                    ListSide::Left => list.push_front(element),
                    ListSide::Right => list.push_back(element),
                },
                Err(Wakeup::StreamAppended { .. }) => {}
            }
        }
    }

    /// Publishes a successful write command on the mutation feed.
    pub fn record_mutation(&self, arguments: Vec<Bytes>) {
        publish_mutation(&self.mutation_feed, arguments);
    }

    pub fn subscribe_mutations(&self) -> broadcast::Receiver<Vec<Bytes>> {
        self.mutation_feed.subscribe()
    }

    /// Snapshot of every live key, sorted by key.
    pub fn export(&mut self) -> Vec<KeyRecord> {
        self.remove_expired();

        let now = Instant::now();
        let wall_clock_now = SystemTime::now();

        let mut records: Vec<KeyRecord> = self
            .entries
            .iter()
            .map(|(key, value)| KeyRecord {
                key: key.clone(),
                data: value.data.clone(),
                expires_at: value
                    .expiration
                    .map(|expiration| wall_clock_now + expiration.saturating_duration_since(now)),
            })
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        records
    }

    /// Loads records, skipping those already expired. Existing keys are replaced.
    pub fn import(&mut self, records: Vec<KeyRecord>) -> usize {
        let now = Instant::now();
        let wall_clock_now = SystemTime::now();
        let mut imported = 0;

        for record in records {
            let expiration = match record.expires_at {
                None => None,
                Some(expires_at) => match expires_at.duration_since(wall_clock_now) {
                    Ok(remaining) if !remaining.is_zero() => Some(now + remaining),
                    _ => continue,
                },
            };

            self.set(record.key, record.data, expiration);
            imported += 1;
        }

        imported
    }
}

/// Clamps Redis-style `start`/`stop` indices to `0..len`. `None` when the range is empty.
pub fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }

    Some((start as usize, stop as usize))
}

fn publish_mutation(feed: &broadcast::Sender<Vec<Bytes>>, arguments: Vec<Bytes>) {
    // No subscribers is the common case.
    let _ = feed.send(arguments);
}

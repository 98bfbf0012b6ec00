//! In-memory key-value store with Redis semantics
//!
//! Strings, bitmaps and integer counters under one keyspace, with lazy
//! expiry against an injected clock. Bitmaps grow on demand and read as 0
//! past their end. A pipeline runs every command under one lock
//! acquisition, which stands in for one network round trip.
//!
//! Used by tests and by single-process deployments. Production deployments
//! plug a networked store into the same `KeyValueStore` port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitvec::prelude::*;
use parking_lot::Mutex;

use super::clock::SystemClock;
use crate::error::StoreError;
use crate::ports::{KeyValueStore, StoreCommand, StoreReply, TimeSource};

enum Value {
    Text(String),
    Bitmap(BitVec<u8, Msb0>),
}

struct Entry {
    value: Value,
    expires_at_millis: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at_millis, Some(at) if at <= now)
    }
}

#[derive(Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    fn purge_if_expired(&mut self, key: &str, now: u64) {
        if matches!(self.entries.get(key), Some(e) if e.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn get(&mut self, key: &str, now: u64) -> Result<Option<String>, StoreError> {
        self.purge_if_expired(key, now);
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>, now: u64) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at_millis: ttl.map(|ttl| now.saturating_add(ttl.as_millis() as u64)),
            },
        );
    }

    fn set_if_absent(&mut self, key: &str, value: &str, ttl: Duration, now: u64) -> bool {
        self.purge_if_expired(key, now);
        if self.entries.contains_key(key) {
            return false;
        }
        self.set(key, value, Some(ttl), now);
        true
    }

    fn increment(&mut self, key: &str, now: u64) -> Result<i64, StoreError> {
        self.purge_if_expired(key, now);
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Text("0".to_string()),
            expires_at_millis: None,
        });
        let Value::Text(text) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        let current: i64 = text.parse().map_err(|_| StoreError::NotAnInteger {
            key: key.to_string(),
        })?;
        let next = current.checked_add(1).ok_or_else(|| StoreError::NotAnInteger {
            key: key.to_string(),
        })?;
        *text = next.to_string();
        Ok(next)
    }

    fn delete(&mut self, key: &str, now: u64) -> bool {
        self.purge_if_expired(key, now);
        self.entries.remove(key).is_some()
    }

    fn get_bit(&mut self, key: &str, offset: u64, now: u64) -> Result<bool, StoreError> {
        self.purge_if_expired(key, now);
        match self.entries.get(key) {
            None => Ok(false),
            Some(Entry {
                value: Value::Bitmap(bits),
                ..
            }) => Ok(bits.get(offset as usize).map(|b| *b).unwrap_or(false)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn set_bit(&mut self, key: &str, offset: u64, value: bool, now: u64) -> Result<bool, StoreError> {
        self.purge_if_expired(key, now);
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Bitmap(BitVec::new()),
            expires_at_millis: None,
        });
        let Value::Bitmap(bits) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        let index = offset as usize;
        if index >= bits.len() {
            // Bitmaps grow a whole byte at a time
            bits.resize((index / 8 + 1) * 8, false);
        }
        let previous = bits[index];
        bits.set(index, value);
        Ok(previous)
    }

    fn get_expire(&mut self, key: &str, now: u64) -> Option<Duration> {
        self.purge_if_expired(key, now);
        self.entries
            .get(key)
            .and_then(|e| e.expires_at_millis)
            .map(|at| Duration::from_millis(at.saturating_sub(now)))
    }

    fn apply(&mut self, command: StoreCommand, now: u64) -> Result<StoreReply, StoreError> {
        match command {
            StoreCommand::GetBit { key, offset } => {
                self.get_bit(&key, offset, now).map(StoreReply::Bool)
            }
            StoreCommand::SetBit { key, offset, value } => {
                self.set_bit(&key, offset, value, now).map(StoreReply::Bool)
            }
            StoreCommand::Get { key } => self.get(&key, now).map(StoreReply::Value),
            StoreCommand::Set { key, value, ttl } => {
                self.set(&key, &value, ttl, now);
                Ok(StoreReply::Ok)
            }
            StoreCommand::Increment { key } => self.increment(&key, now).map(StoreReply::Integer),
            StoreCommand::Delete { key } => Ok(StoreReply::Bool(self.delete(&key, now))),
        }
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

/// Redis-semantics store held in process memory
pub struct InMemoryStore {
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn TimeSource>,
    available: AtomicBool,
    round_trips: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Store expiring keys against the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::default()),
            clock,
            available: AtomicBool::new(true),
            round_trips: AtomicU64::new(0),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Calls served so far; a pipeline counts once
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Length in bits of the bitmap at `key`, if any
    pub fn bitmap_len(&self, key: &str) -> Option<u64> {
        let mut keyspace = self.keyspace.lock();
        keyspace.purge_if_expired(key, self.clock.now_millis());
        match keyspace.entries.get(key) {
            Some(Entry {
                value: Value::Bitmap(bits),
                ..
            }) => Some(bits.len() as u64),
            _ => None,
        }
    }

    /// Live keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = self.clock.now_millis();
        let keyspace = self.keyspace.lock();
        let mut keys: Vec<String> = keyspace
            .entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn begin(&self) -> Result<u64, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        Ok(self.clock.now_millis())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.begin()?;
        self.keyspace.lock().get(key, now)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let now = self.begin()?;
        self.keyspace.lock().set(key, value, ttl, now);
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = self.begin()?;
        Ok(self.keyspace.lock().set_if_absent(key, value, ttl, now))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let now = self.begin()?;
        self.keyspace.lock().increment(key, now)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.begin()?;
        Ok(self.keyspace.lock().delete(key, now))
    }

    async fn get_bit(&self, key: &str, offset: u64) -> Result<bool, StoreError> {
        let now = self.begin()?;
        self.keyspace.lock().get_bit(key, offset, now)
    }

    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool, StoreError> {
        let now = self.begin()?;
        self.keyspace.lock().set_bit(key, offset, value, now)
    }

    async fn get_expire(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.begin()?;
        Ok(self.keyspace.lock().get_expire(key, now))
    }

    async fn pipeline(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        let now = self.begin()?;
        let mut keyspace = self.keyspace.lock();
        let mut replies = Vec::with_capacity(commands.len());
        for (index, command) in commands.into_iter().enumerate() {
            // Earlier commands stay applied; pipelines are not transactions
            let reply = keyspace
                .apply(command, now)
                .map_err(|e| StoreError::Pipeline(format!("command {}: {}", index, e)))?;
            replies.push(reply);
        }
        Ok(replies)
    }
}

//! Outbound Ports (Driven Ports)
//!
//! Dependencies the cache strategies need from the host application:
//! the external key-value store, a clock, the authoritative item
//! repository, and per-call data sources.
//!
//! Production: a Redis-compatible store adapter
//! Testing: `InMemoryStore` (adapters/memory_store.rs)

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::domain::ItemRecord;
use crate::error::{DataError, StoreError};

/// One command inside a pipelined batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCommand {
    GetBit { key: String, offset: u64 },
    SetBit { key: String, offset: u64, value: bool },
    Get { key: String },
    Set { key: String, value: String, ttl: Option<Duration> },
    Increment { key: String },
    Delete { key: String },
}

impl StoreCommand {
    pub fn get_bit(key: impl Into<String>, offset: u64) -> Self {
        StoreCommand::GetBit {
            key: key.into(),
            offset,
        }
    }

    pub fn set_bit(key: impl Into<String>, offset: u64, value: bool) -> Self {
        StoreCommand::SetBit {
            key: key.into(),
            offset,
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        StoreCommand::Delete { key: key.into() }
    }
}

/// Reply to one pipelined command, in command order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreReply {
    /// GetBit value, SetBit previous value, Delete existed
    Bool(bool),
    /// Get result
    Value(Option<String>),
    /// Increment result
    Integer(i64),
    /// Set acknowledgement
    Ok,
}

impl StoreReply {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoreReply::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// External key-value store with Redis-like primitives.
///
/// Every method is a single round trip. `pipeline` batches commands into
/// one round trip but does NOT make them atomic as a group.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value, replacing any previous value and expiry
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Atomic acquire-if-absent with expiry. Returns true if the key was set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    /// Atomic increment; a missing key counts from 0
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn get_bit(&self, key: &str, offset: u64) -> Result<bool, StoreError>;

    /// Set a bit, returning its previous value
    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool, StoreError>;

    /// Remaining time to live; `None` if the key is absent or never expires
    async fn get_expire(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Execute commands in order as one round trip
    async fn pipeline(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError>;
}

/// Abstract interface for time operations (for testability)
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Authoritative item repository (database-backed CRUD)
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, DataError>;

    async fn create(&self, data: String) -> Result<ItemRecord, DataError>;

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, DataError>;

    async fn delete(&self, item_id: u64) -> Result<(), DataError>;
}

/// Future returned by a [`DataSource`]
pub type SourceFuture<'a, T> = BoxFuture<'a, Result<T, DataError>>;

/// Loader for the authoritative value of one cache entry.
///
/// Invoked on miss or refresh, and again by the interceptor when the cache
/// layer fails, so it must be callable more than once.
pub type DataSource<'a, T> = dyn Fn() -> SourceFuture<'a, T> + Send + Sync + 'a;

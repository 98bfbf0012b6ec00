//! In-memory authoritative item repository
//!
//! Stands in for the database behind the cache. Counts reads so tests can
//! assert how often the cache let a lookup through.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ItemRecord;
use crate::error::DataError;
use crate::ports::ItemRepository;

pub struct InMemoryItemRepository {
    items: RwLock<BTreeMap<u64, ItemRecord>>,
    next_id: AtomicU64,
    reads: AtomicU64,
    failing: AtomicBool,
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            reads: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Number of `read` calls served
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every call fail with `DataError::Backend`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DataError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DataError::Backend("repository unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, DataError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn create(&self, data: String) -> Result<ItemRecord, DataError> {
        self.check()?;
        let item_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = ItemRecord::new(item_id, data);
        self.items.write().await.insert(item_id, item.clone());
        Ok(item)
    }

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, DataError> {
        self.check()?;
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&item_id)
            .ok_or_else(|| DataError::NotFound(format!("item {}", item_id)))?;
        item.data = data;
        Ok(item.clone())
    }

    async fn delete(&self, item_id: u64) -> Result<(), DataError> {
        self.check()?;
        self.items.write().await.remove(&item_id);
        Ok(())
    }
}

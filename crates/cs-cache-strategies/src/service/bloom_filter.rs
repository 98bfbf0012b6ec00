//! Bloom filter over a single store bitmap
//!
//! Key: `bloom-filter:{id}`. `add` and `might_contain` issue their k bit
//! operations as one pipeline; the pipeline is not atomic across bits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{BloomFilterParams, StrategyConfig};
use crate::error::{FilterError, StoreError};
use crate::ports::{FilterHandler, KeyValueStore, StoreCommand, StoreReply};

pub struct BloomFilterHandler {
    store: Arc<dyn KeyValueStore>,
    init_chunk_bits: u64,
}

impl BloomFilterHandler {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StrategyConfig) -> Self {
        Self {
            store,
            init_chunk_bits: config.init_chunk_bits,
        }
    }

    pub fn key(filter: &BloomFilterParams) -> String {
        format!("bloom-filter:{}", filter.id())
    }
}

#[async_trait]
impl FilterHandler for BloomFilterHandler {
    type Filter = BloomFilterParams;

    async fn init(&self, filter: &BloomFilterParams) -> Result<(), FilterError> {
        let key = Self::key(filter);
        init_bitmap(self.store.as_ref(), &key, filter.bit_size(), self.init_chunk_bits).await?;
        Ok(())
    }

    async fn add(&self, filter: &BloomFilterParams, value: &str) -> Result<(), FilterError> {
        let key = Self::key(filter);
        let commands = filter
            .hash(value)
            .into_iter()
            .map(|offset| StoreCommand::set_bit(key.as_str(), offset, true))
            .collect();
        self.store.pipeline(commands).await?;
        Ok(())
    }

    async fn might_contain(
        &self,
        filter: &BloomFilterParams,
        value: &str,
    ) -> Result<bool, FilterError> {
        let key = Self::key(filter);
        let commands = filter
            .hash(value)
            .into_iter()
            .map(|offset| StoreCommand::get_bit(key.as_str(), offset))
            .collect();
        let replies = self.store.pipeline(commands).await?;
        Ok(all_bits_set(&replies)?)
    }

    async fn delete(&self, filter: &BloomFilterParams) -> Result<(), FilterError> {
        self.store.delete(&Self::key(filter)).await?;
        Ok(())
    }
}

/// Grow the bitmap at `key` to `bit_size` bits, one chunk per call, so no
/// single call makes the store allocate the whole array at once.
///
/// Sets the last bit of each chunk. Bits are only ever set, so running
/// `init` on a live filter, or a failure part way through, cannot clear a
/// member's bit. Each touched bit may add a false positive.
pub(crate) async fn init_bitmap(
    store: &dyn KeyValueStore,
    key: &str,
    bit_size: u64,
    chunk_bits: u64,
) -> Result<(), StoreError> {
    let chunk_bits = chunk_bits.max(1);
    let mut end = 0u64;
    while end < bit_size {
        end = end.saturating_add(chunk_bits).min(bit_size);
        store.set_bit(key, end - 1, true).await?;
    }
    debug!(key = %key, bit_size, "[BloomFilter] Bitmap pre-allocated");
    Ok(())
}

/// True iff every reply is a set bit
pub(crate) fn all_bits_set(replies: &[StoreReply]) -> Result<bool, StoreError> {
    let mut all_set = true;
    for reply in replies {
        match reply.as_bool() {
            Some(bit) => all_set &= bit,
            None => {
                return Err(StoreError::Pipeline(format!(
                    "expected a bit reply, got {:?}",
                    reply
                )))
            }
        }
    }
    Ok(all_set)
}

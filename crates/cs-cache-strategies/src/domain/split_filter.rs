//! Split Bloom filter
//!
//! One logical bit array of `m` bits partitioned into segments of
//! `split_unit` bits each, so no single stored value has to hold the whole
//! array. The last segment holds the remainder.
//!
//! INVARIANT: sum of segment sizes == m

use serde::{Deserialize, Serialize};

use super::parameters::BloomFilterParams;
use crate::error::FilterError;

/// Default segment size. Production deployments would use 2^32 (the
/// largest bitmap a store value can hold); 2^10 keeps tests small.
pub const DEFAULT_SPLIT_UNIT: u64 = 1 << 10;

/// Location of a global bit offset inside the split layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitLocation {
    /// Segment index
    pub split_index: u64,
    /// Offset within the segment
    pub local_offset: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitBloomFilter {
    params: BloomFilterParams,
    split_unit: u64,
    split_count: u64,
}

impl SplitBloomFilter {
    /// Create with the default split unit
    pub fn create(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
    ) -> Result<Self, FilterError> {
        Self::with_split_unit(id, data_count, false_positive_rate, DEFAULT_SPLIT_UNIT)
    }

    pub fn with_split_unit(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
        split_unit: u64,
    ) -> Result<Self, FilterError> {
        if split_unit == 0 {
            return Err(FilterError::InvalidArgument(
                "split_unit must be greater than 0".to_string(),
            ));
        }
        let params = BloomFilterParams::create(id, data_count, false_positive_rate)?;

        // e.g. m=1024 -> 1 split, m=1025 -> 2 splits
        let split_count = (params.bit_size() - 1) / split_unit + 1;

        Ok(Self {
            params,
            split_unit,
            split_count,
        })
    }

    /// Segment holding the global bit `offset`
    ///
    /// # Errors
    /// `OffsetOutOfRange` if `offset >= m`; it reports
    /// `is_invalid_argument()`.
    pub fn find_split_index(&self, offset: u64) -> Result<u64, FilterError> {
        if offset >= self.params.bit_size() {
            return Err(FilterError::OffsetOutOfRange {
                offset,
                bit_size: self.params.bit_size(),
            });
        }
        Ok(offset / self.split_unit)
    }

    /// Segment and local offset for a global bit offset
    pub fn locate(&self, offset: u64) -> Result<BitLocation, FilterError> {
        let split_index = self.find_split_index(offset)?;
        Ok(BitLocation {
            split_index,
            local_offset: offset % self.split_unit,
        })
    }

    /// Number of bits held by segment `split_index`
    pub fn split_bit_size(&self, split_index: u64) -> Result<u64, FilterError> {
        if split_index >= self.split_count {
            return Err(FilterError::InvalidArgument(format!(
                "split index {} out of range (split_count = {})",
                split_index, self.split_count
            )));
        }
        if split_index == self.split_count - 1 {
            return Ok(self.params.bit_size() - self.split_unit * split_index);
        }
        Ok(self.split_unit)
    }

    /// Locations for every offset `value` hashes to
    pub fn hash_locations(&self, value: &str) -> Result<Vec<BitLocation>, FilterError> {
        self.params
            .hash(value)
            .into_iter()
            .map(|offset| self.locate(offset))
            .collect()
    }

    pub fn id(&self) -> &str {
        self.params.id()
    }

    pub fn params(&self) -> &BloomFilterParams {
        &self.params
    }

    pub fn split_unit(&self) -> u64 {
        self.split_unit
    }

    pub fn split_count(&self) -> u64 {
        self.split_count
    }
}

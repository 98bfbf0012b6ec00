//! Item entity served through the cache strategies

use serde::{Deserialize, Serialize};

/// Item as returned by the authoritative repository
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: u64,
    pub data: String,
}

impl ItemRecord {
    pub fn new(item_id: u64, data: impl Into<String>) -> Self {
        Self {
            item_id,
            data: data.into(),
        }
    }

    /// Value inserted into membership filters for this item
    pub fn filter_value(item_id: u64) -> String {
        item_id.to_string()
    }
}

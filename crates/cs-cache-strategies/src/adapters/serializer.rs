//! JSON value serializer
//!
//! `serialize` fails loudly. `deserialize` never fails: anything that does
//! not decode is reported as `None` and treated by callers as a cache miss.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::CacheError;

/// serde_json-backed serializer for cached values
#[derive(Clone, Copy, Debug, Default)]
pub struct DataSerializer;

impl DataSerializer {
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CacheError> {
        serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    pub fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Option<T> {
        match serde_json::from_str(data) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "[DataSerializer] Undecodable cache value treated as miss");
                None
            }
        }
    }
}

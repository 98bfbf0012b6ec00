//! Error types for the cache strategy subsystem

use thiserror::Error;

use crate::domain::CacheStrategy;

/// Errors raised by filter descriptors and filter handlers
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter parameters: {0}")]
    InvalidArgument(String),

    #[error("Bit offset out of range: {offset} >= {bit_size}")]
    OffsetOutOfRange { offset: u64, bit_size: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl FilterError {
    /// Caller-supplied input was rejected. An out-of-range offset is an
    /// invalid argument that also carries the offending offset.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            FilterError::InvalidArgument(_) | FilterError::OffsetOutOfRange { .. }
        )
    }
}

/// Errors from the external key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Operation against a key holding the wrong kind of value: {key}")]
    WrongType { key: String },

    #[error("Value is not an integer: {key}")]
    NotAnInteger { key: String },

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Errors from the authoritative data source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source error: {0}")]
    Backend(String),
}

/// Errors surfaced by cache handlers, registries and item services
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No handler registered for strategy {0}")]
    UnsupportedStrategy(CacheStrategy),

    #[error("Malformed strategy tag: {0}")]
    MalformedStrategy(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Data source error: {0}")]
    Source(#[from] DataError),
}

impl CacheError {
    /// Configuration errors are fatal; everything else is a cache-layer
    /// failure the interceptor degrades around.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CacheError::UnsupportedStrategy(_) | CacheError::MalformedStrategy(_)
        )
    }
}

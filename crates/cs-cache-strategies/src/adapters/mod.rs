//! Adapters Layer
//!
//! Concrete implementations of the outbound ports:
//! - `InMemoryStore`: Redis-semantics key-value store
//! - `SystemClock` / `ManualClock`: time sources
//! - `DataSerializer`: JSON encoding of cached values
//! - `InMemoryItemRepository`: authoritative item storage

pub mod clock;
pub mod item_repository;
pub mod memory_store;
pub mod serializer;

pub use clock::{ManualClock, SystemClock};
pub use item_repository::InMemoryItemRepository;
pub use memory_store::InMemoryStore;
pub use serializer::DataSerializer;

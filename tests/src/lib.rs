//! # Cache-Shield Test Suite
//!
//! Cross-component scenarios run against `InMemoryStore` and a
//! `ManualClock`.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── filter_benchmarks.rs   # hashing, add / might_contain per layout
//! └── src/integration/
//!     ├── filters.rs             # membership across layouts
//!     ├── growth.rs              # sub-filter growth, lock lease, concurrency
//!     ├── stampede.rs            # jitter spread, PER early refresh
//!     └── fallback.rs            # store outages, strategy dispatch
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cs-tests
//! cargo test -p cs-tests integration::growth::
//! cargo bench -p cs-tests
//! ```

pub mod integration;

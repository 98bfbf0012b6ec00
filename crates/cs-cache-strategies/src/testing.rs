//! Testing utilities
//!
//! Data sources with call counting and simulated cost, shared by the unit
//! tests of this crate and the workspace integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::adapters::ManualClock;
use crate::error::DataError;
use crate::ports::DataSource;

/// Data source returning a preset result and counting its invocations.
///
/// # Example
///
/// ```ignore
/// let source = CountingSource::ok("value".to_string());
/// let load = source.as_source();
/// let value = handler.fetch("key", ttl, &*load).await?;
/// assert_eq!(source.calls(), 1);
/// ```
pub struct CountingSource<T> {
    result: Mutex<Result<T, DataError>>,
    calls: AtomicU32,
    cost: Option<(Arc<ManualClock>, Duration)>,
}

impl<T: Clone + Send + Sync + 'static> CountingSource<T> {
    pub fn ok(value: T) -> Self {
        Self::with_result(Ok(value))
    }

    pub fn err(error: DataError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<T, DataError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: AtomicU32::new(0),
            cost: None,
        }
    }

    /// Advance `clock` by `cost` on every call, simulating an expensive
    /// recomputation
    pub fn with_cost(mut self, clock: Arc<ManualClock>, cost: Duration) -> Self {
        self.cost = Some((clock, cost));
        self
    }

    /// Replace the result returned by later calls
    pub fn set(&self, result: Result<T, DataError>) {
        *self.result.lock() = result;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn as_source(&self) -> Box<DataSource<'_, T>> {
        Box::new(move || {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((clock, cost)) = &self.cost {
                clock.advance(*cost);
            }
            let result = self.result.lock().clone();
            async move { result }.boxed()
        })
    }
}

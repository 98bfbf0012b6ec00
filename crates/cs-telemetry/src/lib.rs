//! # CS Telemetry
//!
//! Logging bootstrap for Cache-Shield services.
//!
//! Library crates only emit `tracing` events; the binary owning `main`
//! installs the subscriber once through this crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cs_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_logging(&config)?;
//!
//!     // Application runs here...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_SERVICE_NAME` | `cache-shield` | Service name in log lines |
//! | `CS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `CS_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `CS_LOG_SOURCE` | follows `CS_JSON_LOGS` | File and line fields |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging, init_test_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Span carrying the strategy tag for everything logged inside it.
///
/// # Example
///
/// ```rust,ignore
/// use cs_telemetry::strategy_span;
///
/// let _span = strategy_span!("read", strategy = "JITTER", item_id = 7).entered();
/// ```
#[macro_export]
macro_rules! strategy_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

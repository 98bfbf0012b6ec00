//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

const DEFAULT_SERVICE_NAME: &str = "cache-shield";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for the logging bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// `EnvFilter` directive (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// JSON formatted logs instead of human-readable ones
    pub json_logs: bool,

    /// Include file and line of the call site
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            with_source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CS_SERVICE_NAME`: Service name (default: cache-shield)
    /// - `CS_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `CS_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `CS_LOG_SOURCE`: Include file/line (default: same as `CS_JSON_LOGS`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let json_logs = lookup("CS_JSON_LOGS")
            .map(|v| is_truthy(&v))
            .unwrap_or(is_container);

        Self {
            service_name: lookup("CS_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),

            log_level: lookup("CS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),

            json_logs,

            with_source_location: lookup("CS_LOG_SOURCE")
                .map(|v| is_truthy(&v))
                .unwrap_or(json_logs),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

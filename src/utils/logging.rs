//! Logging initialization for the runtime and its modules
//!
//! - Respects the RUST_LOG environment variable
//! - Falls back to the configured filter, then to "info"
//! - Honors NO_COLOR
//!
//! Installation is attempted, not forced: when a global subscriber already
//! exists (a test harness, an embedding application) the existing one is kept
//! and the call reports `false`.
//!
//! # Usage
//! ```rust
//! use modos::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when neither RUST_LOG nor config provides one
pub const DEFAULT_FILTER: &str = "info";

/// Resolve the effective filter
///
/// RUST_LOG always takes precedence over the config filter.
pub fn resolve_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    match filter {
        Some(f) => EnvFilter::try_new(f).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        None => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Install the human-readable subscriber
///
/// Returns `false` if a global subscriber was already installed.
///
/// # Example
/// ```rust
/// use modos::utils::init_logging;
///
/// // Config filter; RUST_LOG still takes precedence
/// init_logging(Some("modos=debug"));
/// ```
pub fn init_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(resolve_filter(filter))
        .try_init()
        .is_ok()
}

/// Install the JSON subscriber for log aggregation systems
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(resolve_filter(filter))
        .try_init()
        .is_ok()
}

/// Install logging from `RuntimeConfig.logging`
///
/// `json_format` without the `json-logging` feature falls back to the
/// human-readable format.
///
/// # Example
/// ```rust
/// use modos::config::RuntimeConfig;
/// use modos::utils::init_logging_from_config;
///
/// let config = RuntimeConfig::default();
/// init_logging_from_config(config.logging.as_ref());
/// ```
pub fn init_logging_from_config(config: Option<&LoggingConfig>) -> bool {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            return init_json_logging(filter);
        }
    }
    init_logging(filter)
}

//! Runtime utilities: logging setup, signals, lifecycle deadlines, env helpers

pub mod env;
pub mod logging;
pub mod signal;
pub mod timeout;

pub use env::{env_bool, env_opt, env_parse};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config, resolve_filter};
pub use signal::{wait_for_shutdown_signal, ShutdownSignal};
pub use timeout::with_lifecycle_timeout;

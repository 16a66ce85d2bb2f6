//! Timeout utilities for module lifecycle calls
//!
//! Lifecycle calls have no deadline unless one is configured.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::module::traits::ModuleError;

/// Await a lifecycle call, bounded by `limit` when set
///
/// An elapsed deadline becomes `ModuleError::Timeout` naming the module.
pub async fn with_lifecycle_timeout<F, T>(
    module: &str,
    limit: Option<Duration>,
    operation: F,
) -> Result<T, ModuleError>
where
    F: Future<Output = Result<T, ModuleError>>,
{
    match limit {
        None => operation.await,
        Some(duration) => timeout(duration, operation)
            .await
            .map_err(|_| ModuleError::Timeout(module.to_string()))?,
    }
}

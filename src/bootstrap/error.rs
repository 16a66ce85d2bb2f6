//! Fatal bootstrap errors
//!
//! Only these unwind past a phase boundary. Every other module failure is
//! recorded in the report and logged where it happens.

use thiserror::Error;

use crate::bootstrap::report::LifecycleStage;
use crate::module::traits::ModuleError;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("critical module {name} failed to {stage}: {source}")]
    CriticalModule {
        name: String,
        stage: LifecycleStage,
        #[source]
        source: ModuleError,
    },

    #[error("protocol servers failed to attach: {0}")]
    ProtocolServers(#[source] ModuleError),

    #[error("bootstrap already ran; shut down before bootstrapping again")]
    AlreadyBootstrapped,
}

impl BootstrapError {
    /// Underlying module error, if any
    pub fn module_error(&self) -> Option<&ModuleError> {
        match self {
            BootstrapError::CriticalModule { source, .. } => Some(source),
            BootstrapError::ProtocolServers(source) => Some(source),
            BootstrapError::AlreadyBootstrapped => None,
        }
    }

    /// Name of the module that aborted the bootstrap
    pub fn module_name(&self) -> Option<&str> {
        match self {
            BootstrapError::CriticalModule { name, .. } => Some(name),
            _ => None,
        }
    }
}

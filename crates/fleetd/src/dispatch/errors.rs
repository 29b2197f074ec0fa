//! Error types for command handling failures.
//!
//! None of these reach the client verbatim: the router logs the error and
//! answers with the generic error line.

use thiserror::Error;

use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::vm::VmValidationError;

/// Errors surfaced while executing a parsed command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// RAM, CPU or disk size was not positive.
    #[error("invalid VM parameters: {0}")]
    Validation(#[from] VmValidationError),

    /// The persistence gateway or credential store failed.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// The in-memory registry is unusable.
    #[error("registry unavailable: {0}")]
    Registry(#[from] RegistryError),

    /// A session panicked while updating a VM.
    #[error("VM update lock poisoned")]
    UpdateLockPoisoned,
}

impl DispatchError {
    /// Short label used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
            Self::Registry(_) => "registry",
            Self::UpdateLockPoisoned => "update_lock",
        }
    }
}

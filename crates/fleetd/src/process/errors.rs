//! Error surface for daemon launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors that stop the daemon from starting or from shutting down cleanly.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry or the fleet store could not be set up.
    #[error("daemon bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// The listen socket could not be bound or its accept loop failed.
    #[error("session listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Termination signals could not be observed.
    #[error("failed to await shutdown signal: {0}")]
    Shutdown(#[from] ShutdownError),
}

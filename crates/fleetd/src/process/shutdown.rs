//! Signal-driven shutdown.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use signal_hook::low_level::signal_name;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that stop the daemon.
const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Blocks the launching thread until the daemon should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once a termination request has been observed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the request cannot be observed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failures while waiting for a termination signal.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to register termination signal handlers: {0}")]
    Register(#[source] io::Error),
}

/// Waits for the first of SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new(TERMINATION_SIGNALS).map_err(ShutdownError::Register)?;
        if let Some(signal) = signals.forever().next() {
            info!(
                target: PROCESS_TARGET,
                signal = signal_name(signal).unwrap_or("unknown"),
                "termination signal received; stopping"
            );
        }
        Ok(())
    }
}

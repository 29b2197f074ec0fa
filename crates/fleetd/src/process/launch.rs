//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the daemon in the foreground until a termination signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding or signal installation
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the daemon with injected collaborators.
///
/// The store is opened during bootstrap, before the socket is bound, so an
/// unreachable database leaves nothing listening.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter)?;
    let listener = SocketListener::bind(daemon.config().listen_socket())?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %daemon.config().listen_socket(),
        local_addr = ?listener.local_addr(),
        "daemon listening"
    );

    let handle = listener.start(Arc::new(daemon.connection_handler()))?;
    let waited = shutdown.wait();
    handle.shutdown();
    handle.join()?;
    waited?;

    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

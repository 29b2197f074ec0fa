//! Test harness utilities shared by the daemon suites.

mod config_loader;
mod reporter;
mod session;

pub use config_loader::{BlockedDatabaseLoader, FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use session::{FleetClient, RunningDaemon};

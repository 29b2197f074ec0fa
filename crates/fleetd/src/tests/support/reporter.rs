//! Health reporter double that records lifecycle events.

use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use fleet_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Reporter double that keeps every lifecycle event in arrival order.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn store_ready(&self, path: &Utf8Path) {
        self.record(HealthEvent::StoreReady(path.to_owned()));
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded {
            endpoint: config.listen_socket().to_string(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// The fleet store opened at the given path.
    StoreReady(Utf8PathBuf),
    /// Bootstrap completed for the given listen endpoint.
    BootstrapSucceeded { endpoint: String },
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
}

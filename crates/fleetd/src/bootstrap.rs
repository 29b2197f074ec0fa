//! Daemon bootstrap orchestration.
//!
//! Bootstrap loads configuration, installs telemetry, prepares the socket
//! directory and opens the fleet store. Any failure is reported through the
//! [`HealthReporter`] and aborts startup before a socket is bound.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use fleet_config::{Config, SocketPreparationError};

use crate::dispatch::{CommandRouter, DispatchConnectionHandler};
use crate::health::HealthReporter;
use crate::registry::VmRegistry;
use crate::store::{SqliteStore, StoreError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the daemon configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare listen socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// The fleet store could not be opened.
    #[error("failed to open fleet store: {source}")]
    Store {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

/// Result of a successful bootstrap: configuration plus the shared state
/// every session works against.
pub struct Daemon {
    config: Config,
    store: Arc<SqliteStore>,
    registry: Arc<VmRegistry>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared VM registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<VmRegistry> {
        &self.registry
    }

    /// Shared store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds the session handler wired to this daemon's registry and store.
    #[must_use]
    pub fn connection_handler(&self) -> DispatchConnectionHandler {
        let router = CommandRouter::new(
            Arc::clone(&self.registry),
            self.store.clone(),
            self.store.clone(),
        );
        DispatchConnectionHandler::new(
            router,
            self.config.idle_timeout(),
            self.config.message_limit(),
        )
    }
}

/// Bootstraps the daemon using the supplied collaborators.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
    config
        .listen_socket()
        .prepare_filesystem()
        .map_err(|source| fail(BootstrapError::Socket { source }))?;
    let store = SqliteStore::open(config.database_path(), config.database_pool_size())
        .map_err(|source| fail(BootstrapError::Store { source }))?;
    reporter.store_ready(config.database_path());

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        store: Arc::new(store),
        registry: Arc::new(VmRegistry::new()),
        telemetry,
    })
}

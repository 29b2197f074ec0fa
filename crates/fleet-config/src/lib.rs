//! Shared configuration for the fleet daemon (`fleetd`) and client (`fleet`).
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then a
//! configuration file (`.fleet.toml`, or the file named by `--config-path` /
//! `FLEET_CONFIG_PATH`), then `FLEET_*` environment variables, then command
//! line flags.
//!
//! ```toml
//! listen_socket = { transport = "tcp", host = "0.0.0.0", port = 8888 }
//! idle_timeout_secs = 120
//! database_path = "/var/lib/fleet/fleet.sqlite3"
//! log_format = "compact"
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_DATABASE_POOL_SIZE, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LOG_FILTER,
    DEFAULT_MESSAGE_LIMIT, DEFAULT_PORT, default_database_path, default_listen_socket,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration for both binaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FLEET")]
pub struct Config {
    /// Endpoint the daemon binds and the client connects to.
    #[ortho_config(default = defaults::default_listen_socket())]
    pub listen_socket: SocketEndpoint,
    /// Seconds of client silence tolerated before a session is closed.
    #[ortho_config(default = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,
    /// Upper bound on bytes taken from the socket by one read.
    #[ortho_config(default = DEFAULT_MESSAGE_LIMIT)]
    pub message_limit: usize,
    /// SQLite database holding users, VMs and disks.
    #[ortho_config(default = defaults::default_database_path())]
    pub database_path: Utf8PathBuf,
    /// Number of SQLite connections kept open by the daemon.
    #[ortho_config(default = DEFAULT_DATABASE_POOL_SIZE)]
    pub database_pool_size: usize,
    /// `tracing` filter directive, for example `info,fleetd::dispatch=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Layout of emitted log lines.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_listen_socket(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            message_limit: DEFAULT_MESSAGE_LIMIT,
            database_path: default_database_path(),
            database_pool_size: DEFAULT_DATABASE_POOL_SIZE,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint shared by the daemon and the client.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Idle timeout applied to every client session.
    ///
    /// A configured value of zero is raised to one second: a zero read
    /// timeout is rejected by the standard library sockets.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }

    /// Per-read byte limit, never below one byte.
    #[must_use]
    pub fn message_limit(&self) -> usize {
        self.message_limit.max(1)
    }

    /// Path of the SQLite database.
    #[must_use]
    pub fn database_path(&self) -> &Utf8Path {
        &self.database_path
    }

    /// Number of pooled database connections, never below one.
    #[must_use]
    pub fn database_pool_size(&self) -> usize {
        self.database_pool_size.max(1)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.listen_socket(), &SocketEndpoint::tcp("127.0.0.1", 8888));
        assert_eq!(config.idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.message_limit(), 1024);
        assert_eq!(config.database_pool_size(), 4);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.database_path().ends_with("fleet/fleet.sqlite3"));
    }

    #[test]
    fn zero_limits_are_clamped() {
        let config = Config {
            idle_timeout_secs: 0,
            message_limit: 0,
            database_pool_size: 0,
            ..Config::default()
        };
        assert_eq!(config.idle_timeout(), Duration::from_secs(1));
        assert_eq!(config.message_limit(), 1);
        assert_eq!(config.database_pool_size(), 1);
    }
}

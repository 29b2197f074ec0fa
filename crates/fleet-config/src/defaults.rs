use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Address the daemon binds when nothing else is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the daemon listens on and the client dials by default.
pub const DEFAULT_PORT: u16 = 8888;

/// Seconds a connection may stay silent before the daemon closes it.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Maximum number of bytes consumed by a single socket read.
pub const DEFAULT_MESSAGE_LIMIT: usize = 1024;

/// Number of pooled SQLite connections.
pub const DEFAULT_DATABASE_POOL_SIZE: usize = 4;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

const DATABASE_FILE_NAME: &str = "fleet.sqlite3";

/// Default endpoint shared by `fleetd` and `fleet`.
#[must_use]
pub fn default_listen_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_PORT)
}

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Location of the SQLite database when none is configured.
///
/// Uses the platform data directory (`$XDG_DATA_HOME/fleet` on Linux) and
/// falls back to the system temporary directory when that is unavailable or
/// not valid UTF-8.
#[must_use]
pub fn default_database_path() -> Utf8PathBuf {
    let mut base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push("fleet");
    base.push(DATABASE_FILE_NAME);
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

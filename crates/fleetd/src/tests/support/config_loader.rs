//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use fleet_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port and keeps the database
/// under a temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for database");
        Self { dir }
    }

    /// Location of the database file the loader hands out.
    pub fn database_path(&self) -> Utf8PathBuf {
        let path = self.dir.path().join("state").join("fleet.sqlite3");
        Utf8PathBuf::from_path_buf(path).expect("temporary database path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            database_path: self.database_path(),
            ..Config::default()
        })
    }
}

/// Loader whose database path sits beneath a regular file, so the store can
/// never be opened.
pub struct BlockedDatabaseLoader {
    dir: TempDir,
}

impl BlockedDatabaseLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        std::fs::write(dir.path().join("blocker"), b"not a directory")
            .expect("failed to write blocking file");
        Self { dir }
    }
}

impl ConfigLoader for BlockedDatabaseLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let path = self.dir.path().join("blocker").join("fleet.sqlite3");
        Ok(Config {
            listen_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            database_path: Utf8PathBuf::from_path_buf(path)
                .expect("temporary database path was not valid UTF-8"),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid endpoint flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("fleetd"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}

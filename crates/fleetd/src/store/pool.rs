//! Fixed-size pool of SQLite connections.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use camino::Utf8Path;
use rusqlite::Connection;
use tracing::debug;

use super::{STORE_TARGET, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connections opened once at startup and lent out per operation.
///
/// A caller holds a connection only for the closure passed to
/// [`SqlitePool::with_connection`], so no connection outlives a statement
/// group.
#[derive(Debug)]
pub struct SqlitePool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl SqlitePool {
    /// Opens `size` connections to the database at `path`, creating the file
    /// and its parent directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the directory, file or pragmas fail.
    pub fn open(path: &Utf8Path, size: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let connections = (0..size.max(1))
            .map(|_| open_connection(path).map(Mutex::new))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            target: STORE_TARGET,
            path = %path,
            connections = connections.len(),
            "database pool opened"
        );
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Number of pooled connections.
    #[must_use]
    pub fn size(&self) -> usize {
        self.connections.len()
    }

    /// Runs `operation` with exclusive use of one pooled connection.
    ///
    /// Idle connections are preferred; when every connection is busy the
    /// caller waits on the next one in rotation.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or [`StoreError::Poisoned`] when the
    /// chosen connection was poisoned.
    pub fn with_connection<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut connection = self.acquire()?;
        operation(&mut connection)
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        let count = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % count;
        for offset in 0..count {
            match self.connections[(start + offset) % count].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Poisoned(_)) => return Err(StoreError::Poisoned),
            }
        }
        self.connections[start]
            .lock()
            .map_err(|_| StoreError::Poisoned)
    }
}

fn open_connection(path: &Utf8Path) -> Result<Connection, StoreError> {
    let connection = Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mode: String = connection
        .pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))
        .map_err(|error| StoreError::Configure {
            message: format!("journal_mode: {error}"),
        })?;
    if !mode.eq_ignore_ascii_case("wal") {
        return Err(StoreError::Configure {
            message: format!("journal_mode is '{mode}', expected 'wal'"),
        });
    }
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .map_err(|error| StoreError::Configure {
            message: format!("foreign_keys: {error}"),
        })?;
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| StoreError::Configure {
            message: format!("busy_timeout: {error}"),
        })?;
    Ok(connection)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn database_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn database_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("nested").join("fleet.sqlite3"))
            .expect("utf8 temp path")
    }

    #[rstest]
    fn opens_requested_number_of_connections(database_dir: TempDir) {
        let pool = SqlitePool::open(&database_path(&database_dir), 3).expect("open pool");
        assert_eq!(pool.size(), 3);
    }

    #[rstest]
    fn zero_sized_pool_still_has_one_connection(database_dir: TempDir) {
        let pool = SqlitePool::open(&database_path(&database_dir), 0).expect("open pool");
        assert_eq!(pool.size(), 1);
    }

    #[rstest]
    fn connections_enable_wal_and_foreign_keys(database_dir: TempDir) {
        let pool = SqlitePool::open(&database_path(&database_dir), 1).expect("open pool");
        let (mode, foreign_keys) = pool
            .with_connection(|connection| {
                let mode: String =
                    connection.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let keys: i64 = connection.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
                Ok((mode, keys))
            })
            .expect("query pragmas");
        assert_eq!(mode.to_ascii_lowercase(), "wal");
        assert_eq!(foreign_keys, 1);
    }

    #[rstest]
    fn unwritable_location_fails_to_open(database_dir: TempDir) {
        let blocker = database_dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").expect("write blocker");
        let path = Utf8PathBuf::from_path_buf(blocker.join("fleet.sqlite3")).expect("utf8 path");

        let error = SqlitePool::open(&path, 1).expect_err("parent is a file");
        assert!(matches!(error, StoreError::CreateDirectory { .. }));
    }
}

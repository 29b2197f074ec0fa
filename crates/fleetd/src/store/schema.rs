use rusqlite::Connection;

use super::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL UNIQUE,
    salt BLOB NOT NULL,
    password_hash BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS virtual_machines (
    id TEXT PRIMARY KEY,
    ram INTEGER NOT NULL CHECK (ram > 0),
    cpu INTEGER NOT NULL CHECK (cpu > 0)
);

CREATE TABLE IF NOT EXISTS disks (
    id TEXT PRIMARY KEY,
    size INTEGER NOT NULL CHECK (size > 0)
);

CREATE TABLE IF NOT EXISTS vm_disks (
    vm_id TEXT NOT NULL REFERENCES virtual_machines (id),
    disk_id TEXT NOT NULL REFERENCES disks (id),
    PRIMARY KEY (vm_id, disk_id)
);
";

/// Creates any missing tables. Safe to run against an existing database.
pub(super) fn apply(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(SCHEMA)
        .map_err(|source| StoreError::Schema { source })
}

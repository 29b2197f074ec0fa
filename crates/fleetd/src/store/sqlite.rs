//! SQLite implementation of the fleet and credential stores.

use camino::Utf8Path;
use rusqlite::{ErrorCode, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::vm::{Resources, VirtualMachine};

use super::credentials::{self, HashedSecret};
use super::{
    AccountCreation, CredentialStore, DiskPlacement, DiskRecord, FleetStore, STORE_TARGET,
    SqlitePool, StoreError, UserRecord, schema,
};

/// Store backed by a pooled SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database, creating missing tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened or the schema
    /// cannot be applied.
    pub fn open(path: &Utf8Path, pool_size: usize) -> Result<Self, StoreError> {
        let pool = SqlitePool::open(path, pool_size)?;
        pool.with_connection(|connection| schema::apply(connection))?;
        info!(
            target: STORE_TARGET,
            path = %path,
            pool_size = pool.size(),
            "database ready"
        );
        Ok(Self { pool })
    }

    /// Reads the persisted RAM and CPU of one VM.
    #[cfg(test)]
    pub(crate) fn vm_resources(&self, vm_id: Uuid) -> Result<Option<(u64, u64)>, StoreError> {
        let row: Option<(i64, i64)> = self.pool.with_connection(|connection| {
            Ok(connection
                .query_row(
                    "SELECT ram, cpu FROM virtual_machines WHERE id = ?1",
                    params![vm_id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?)
        })?;
        row.map(|(ram, cpu)| {
            Ok((
                from_sql_int("virtual_machines.ram", ram)?,
                from_sql_int("virtual_machines.cpu", cpu)?,
            ))
        })
        .transpose()
    }
}

fn to_sql_int(column: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::invalid_value(column, value))
}

fn from_sql_int(column: &'static str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::invalid_value(column, value))
}

fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|_| StoreError::invalid_value(column, value))
}

impl FleetStore for SqliteStore {
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.pool.with_connection(|connection| {
            let mut statement = connection.prepare("SELECT id, login FROM users ORDER BY id")?;
            let users = statement
                .query_map([], |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        login: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    fn disk_size(&self, disk_id: Uuid) -> Result<Option<u64>, StoreError> {
        let size: Option<i64> = self.pool.with_connection(|connection| {
            Ok(connection
                .query_row(
                    "SELECT size FROM disks WHERE id = ?1",
                    params![disk_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        size.map(|size| from_sql_int("disks.size", size))
            .transpose()
    }

    fn record_vm(&self, vm: &VirtualMachine, placement: DiskPlacement) -> Result<(), StoreError> {
        let vm_id = vm.vm_id().to_string();
        let ram = to_sql_int("virtual_machines.ram", vm.resources().ram())?;
        let cpu = to_sql_int("virtual_machines.cpu", vm.resources().cpu())?;
        let disk_id = placement.disk_id().to_string();

        self.pool.with_connection(|connection| {
            let transaction = connection.transaction()?;
            transaction.execute(
                "INSERT INTO virtual_machines (id, ram, cpu) VALUES (?1, ?2, ?3)",
                params![vm_id, ram, cpu],
            )?;
            if let DiskPlacement::Create { size, .. } = placement {
                transaction.execute(
                    "INSERT INTO disks (id, size) VALUES (?1, ?2)",
                    params![disk_id, to_sql_int("disks.size", size)?],
                )?;
            }
            transaction.execute(
                "INSERT INTO vm_disks (vm_id, disk_id) VALUES (?1, ?2)",
                params![vm_id, disk_id],
            )?;
            transaction.commit()?;
            Ok(())
        })?;

        debug!(
            target: STORE_TARGET,
            vm_id = %vm.vm_id(),
            disk_id = %placement.disk_id(),
            created_disk = matches!(placement, DiskPlacement::Create { .. }),
            "VM recorded"
        );
        Ok(())
    }

    fn update_vm_resources(&self, vm_id: Uuid, resources: Resources) -> Result<bool, StoreError> {
        let ram = to_sql_int("virtual_machines.ram", resources.ram())?;
        let cpu = to_sql_int("virtual_machines.cpu", resources.cpu())?;
        let changed = self.pool.with_connection(|connection| {
            Ok(connection.execute(
                "UPDATE virtual_machines SET ram = ?1, cpu = ?2 WHERE id = ?3",
                params![ram, cpu, vm_id.to_string()],
            )?)
        })?;
        Ok(changed > 0)
    }

    fn list_disks(&self) -> Result<Vec<DiskRecord>, StoreError> {
        let rows: Vec<(String, i64)> = self.pool.with_connection(|connection| {
            let mut statement = connection.prepare("SELECT id, size FROM disks ORDER BY rowid")?;
            let rows = statement
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        rows.into_iter()
            .map(|(id, size)| {
                Ok(DiskRecord {
                    id: parse_uuid("disks.id", &id)?,
                    size: from_sql_int("disks.size", size)?,
                })
            })
            .collect()
    }
}

impl CredentialStore for SqliteStore {
    fn create_account(&self, login: &str, secret: &str) -> Result<AccountCreation, StoreError> {
        let hashed = HashedSecret::new(secret);
        self.pool.with_connection(|connection| {
            match connection.execute(
                "INSERT INTO users (login, salt, password_hash) VALUES (?1, ?2, ?3)",
                params![login, hashed.salt, hashed.digest],
            ) {
                Ok(_) => Ok(AccountCreation::Created),
                Err(rusqlite::Error::SqliteFailure(error, _))
                    if error.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(AccountCreation::Exists)
                }
                Err(error) => Err(error.into()),
            }
        })
    }

    fn verify_credentials(&self, login: &str, secret: &str) -> Result<bool, StoreError> {
        let stored: Option<(Vec<u8>, Vec<u8>)> = self.pool.with_connection(|connection| {
            Ok(connection
                .query_row(
                    "SELECT salt, password_hash FROM users WHERE login = ?1",
                    params![login],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?)
        })?;
        Ok(credentials::verify(
            stored
                .as_ref()
                .map(|(salt, digest)| (salt.as_slice(), digest.as_slice())),
            secret,
        ))
    }
}

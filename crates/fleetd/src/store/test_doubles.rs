//! Store doubles shared by dispatch and session tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

use crate::vm::{Resources, VirtualMachine};

use super::{
    AccountCreation, CredentialStore, DiskPlacement, DiskRecord, FleetStore, SqliteStore,
    StoreError, UserRecord,
};

/// SQLite store in a temporary directory removed on drop.
pub(crate) struct TempStore {
    pub(crate) store: Arc<SqliteStore>,
    _dir: TempDir,
}

impl TempStore {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("fleet.sqlite3"))
            .expect("utf8 temp path");
        let store = SqliteStore::open(&path, 2).expect("open store");
        Self {
            store: Arc::new(store),
            _dir: dir,
        }
    }
}

/// Store whose every operation fails as if the database were unreachable.
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Poisoned)
}

impl FleetStore for FailingStore {
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        unavailable()
    }

    fn disk_size(&self, _disk_id: Uuid) -> Result<Option<u64>, StoreError> {
        unavailable()
    }

    fn record_vm(&self, _vm: &VirtualMachine, _placement: DiskPlacement) -> Result<(), StoreError> {
        unavailable()
    }

    fn update_vm_resources(&self, _vm_id: Uuid, _resources: Resources) -> Result<bool, StoreError> {
        unavailable()
    }

    fn list_disks(&self) -> Result<Vec<DiskRecord>, StoreError> {
        unavailable()
    }
}

impl CredentialStore for FailingStore {
    fn create_account(&self, _login: &str, _secret: &str) -> Result<AccountCreation, StoreError> {
        unavailable()
    }

    fn verify_credentials(&self, _login: &str, _secret: &str) -> Result<bool, StoreError> {
        unavailable()
    }
}

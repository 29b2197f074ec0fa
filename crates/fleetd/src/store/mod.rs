//! Durable state for users, VMs and disks.
//!
//! The dispatcher talks to persistence through two traits: [`FleetStore`]
//! for fleet records and [`CredentialStore`] for account secrets. Both are
//! implemented by [`SqliteStore`], which hands each operation one connection
//! from a small [`SqlitePool`].

mod credentials;
mod errors;
mod pool;
mod schema;
mod sqlite;
#[cfg(test)]
pub(crate) mod test_doubles;

use uuid::Uuid;

use crate::vm::{Resources, VirtualMachine};

pub use self::errors::StoreError;
pub use self::pool::SqlitePool;
pub use self::sqlite::SqliteStore;

pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Store-assigned numeric identifier.
    pub id: i64,
    /// Unique login name.
    pub login: String,
}

/// A persisted disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskRecord {
    /// Disk identifier.
    pub id: Uuid,
    /// Disk size.
    pub size: u64,
}

/// How the disk of a newly added VM is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskPlacement {
    /// Link an existing disk; no disk row is written.
    Attach {
        /// Existing disk identifier.
        disk_id: Uuid,
    },
    /// Create a fresh disk row before linking it.
    Create {
        /// Newly minted disk identifier.
        disk_id: Uuid,
        /// Size of the new disk.
        size: u64,
    },
}

impl DiskPlacement {
    /// Identifier of the disk linked to the VM.
    #[must_use]
    pub const fn disk_id(&self) -> Uuid {
        match self {
            Self::Attach { disk_id } | Self::Create { disk_id, .. } => *disk_id,
        }
    }
}

/// Outcome of an account creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCreation {
    /// A new account was stored.
    Created,
    /// The login was already taken; nothing changed.
    Exists,
}

/// Persistence operations for fleet records.
pub trait FleetStore: Send + Sync {
    /// Lists every user ordered by identifier.
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Looks up the size of a stored disk.
    fn disk_size(&self, disk_id: Uuid) -> Result<Option<u64>, StoreError>;

    /// Writes the VM row, the disk row when `placement` creates one, and the
    /// VM-disk links, all in one transaction.
    fn record_vm(&self, vm: &VirtualMachine, placement: DiskPlacement) -> Result<(), StoreError>;

    /// Rewrites the RAM and CPU of a stored VM.
    ///
    /// Returns `false` when no VM row matches `vm_id`.
    fn update_vm_resources(&self, vm_id: Uuid, resources: Resources) -> Result<bool, StoreError>;

    /// Lists every disk in creation order.
    fn list_disks(&self) -> Result<Vec<DiskRecord>, StoreError>;
}

/// Account creation and verification.
pub trait CredentialStore: Send + Sync {
    /// Stores a new account unless `login` is taken.
    fn create_account(&self, login: &str, secret: &str) -> Result<AccountCreation, StoreError>;

    /// Checks `secret` against the stored credential for `login`.
    ///
    /// Unknown logins verify as `false`.
    fn verify_credentials(&self, login: &str, secret: &str) -> Result<bool, StoreError>;
}

//! Fleet daemon: a line-protocol service that tracks virtual machines.
//!
//! Clients connect over TCP (or a Unix socket) and issue one command per
//! line. The daemon keeps users, VMs and disks in SQLite and holds the set of
//! connected and authenticated VMs in memory for the lifetime of the process.
//!
//! Startup follows a fixed order: configuration is resolved through
//! [`fleet_config`], telemetry is installed, the fleet store is opened and its
//! schema applied, and only then is the listen socket bound. A store that
//! cannot be opened therefore aborts startup before any client can connect.
//!
//! ## Protocol
//!
//! | Command | Response |
//! |---------|----------|
//! | `ADD_USER <login> <secret>` | `User <login> created successfully` or `User already exists` |
//! | `LIST_USERS` | `User <id>: <login>` per user, or `no users` |
//! | `AUTH <vm_id> <login> <secret>` | `AUTHENTICATE_SUCCESS` or `AUTHENTICATE_FAIL` |
//! | `ADD_VM <ram> <cpu> <disk_size> [<disk_id>]` | summary of the new VM |
//! | `LIST_CON_VM` | connected VMs, or `no connect VM` |
//! | `LIST_AU_VM` | authenticated VM ids, or `no authenticate VM` |
//! | `LIST_ALL_VM` | every VM added since startup, or `no VM registered` |
//! | `UPDATE_VM <vm_id> <ram> <cpu>` | `VM <id> updated: RAM=<ram>, CPU=<cpu>` or `VM <id> not found` |
//! | `LOGOUT_VM <vm_id>` | `VM <id> logged out` or `VM <id> not found` |
//! | `LIST_DISKS` | `Disk <id>: <size>` per disk, or `no disks` |

mod bootstrap;
mod dispatch;
mod health;
mod process;
mod registry;
mod store;
mod telemetry;
mod transport;
mod vm;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{CommandRouter, DispatchConnectionHandler, DispatchError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use registry::{RegistryError, VmRegistry};
pub use store::{
    AccountCreation, CredentialStore, DiskPlacement, DiskRecord, FleetStore, SqlitePool,
    SqliteStore, StoreError, UserRecord,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;
pub use vm::{Resources, VirtualMachine, VmValidationError, disk_size};

#[cfg(test)]
mod tests;

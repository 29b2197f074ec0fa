//! Command routing and handlers.
//!
//! Each handler returns the response text for its command. Handlers that
//! touch the store write there first and mutate the registry only after the
//! write succeeded, so the registry never holds a VM the database lacks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::VmRegistry;
use crate::store::{AccountCreation, CredentialStore, DiskPlacement, FleetStore};
use crate::vm::{self, Resources, VirtualMachine};

use super::command::Command;
use super::errors::DispatchError;
use super::response::{self, listing};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes parsed commands to their handlers.
///
/// Cloning is cheap; every clone shares the same registry and stores.
#[derive(Clone)]
pub struct CommandRouter {
    registry: Arc<VmRegistry>,
    fleet: Arc<dyn FleetStore>,
    credentials: Arc<dyn CredentialStore>,
    /// Held across the store and registry writes of `UPDATE_VM`.
    update_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for CommandRouter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandRouter")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl CommandRouter {
    /// Creates a router over a shared registry and store handles.
    pub fn new(
        registry: Arc<VmRegistry>,
        fleet: Arc<dyn FleetStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            registry,
            fleet,
            credentials,
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Registry shared by every session.
    #[must_use]
    pub fn registry(&self) -> &Arc<VmRegistry> {
        &self.registry
    }

    /// Executes `command` and returns the response text.
    ///
    /// Failures never escape: they are logged and answered with the generic
    /// error line.
    pub(crate) fn route(&self, command: Command) -> String {
        let name = command.name().to_owned();
        debug!(target: DISPATCH_TARGET, command = %name, "routing command");
        match self.execute(command) {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    command = %name,
                    kind = error.kind(),
                    %error,
                    "command failed"
                );
                response::GENERIC_ERROR.to_owned()
            }
        }
    }

    fn execute(&self, command: Command) -> Result<String, DispatchError> {
        match command {
            Command::AddUser { login, secret } => self.add_user(&login, &secret),
            Command::ListUsers => self.list_users(),
            Command::Auth {
                vm_id,
                login,
                secret,
            } => self.authenticate(vm_id, &login, &secret),
            Command::AddVm {
                ram,
                cpu,
                disk_size,
                disk_id,
            } => self.add_vm(ram, cpu, disk_size, disk_id),
            Command::ListConnected => Ok(listing(
                self.registry.connected()?,
                response::NO_CONNECTED_VMS,
            )),
            Command::ListAuthenticated => Ok(listing(
                self.registry.authenticated()?,
                response::NO_AUTHENTICATED_VMS,
            )),
            Command::ListAll => Ok(listing(
                self.registry.history()?,
                response::NO_REGISTERED_VMS,
            )),
            Command::UpdateVm { vm_id, ram, cpu } => self.update_vm(vm_id, ram, cpu),
            Command::LogoutVm { vm_id } => self.logout_vm(vm_id),
            Command::ListDisks => self.list_disks(),
            Command::Unrecognized { name } => {
                debug!(target: DISPATCH_TARGET, command = %name, "unrecognized command");
                Ok(response::UNKNOWN_COMMAND.to_owned())
            }
        }
    }

    fn add_user(&self, login: &str, secret: &str) -> Result<String, DispatchError> {
        match self.credentials.create_account(login, secret)? {
            AccountCreation::Created => {
                info!(target: DISPATCH_TARGET, login, "user created");
                Ok(response::user_created(login))
            }
            AccountCreation::Exists => Ok(response::USER_EXISTS.to_owned()),
        }
    }

    fn list_users(&self) -> Result<String, DispatchError> {
        let users = self.fleet.list_users()?;
        Ok(listing(
            users
                .iter()
                .map(|user| format!("User {}: {}", user.id, user.login)),
            response::NO_USERS,
        ))
    }

    fn authenticate(&self, vm_id: Uuid, login: &str, secret: &str) -> Result<String, DispatchError> {
        if !self.credentials.verify_credentials(login, secret)? {
            info!(target: DISPATCH_TARGET, %vm_id, login, "authentication rejected");
            return Ok(response::AUTHENTICATE_FAIL.to_owned());
        }
        self.registry.mark_authenticated(vm_id)?;
        info!(target: DISPATCH_TARGET, %vm_id, login, "VM authenticated");
        Ok(response::AUTHENTICATE_SUCCESS.to_owned())
    }

    fn add_vm(
        &self,
        ram: i64,
        cpu: i64,
        disk_size: i64,
        disk_id: Option<Uuid>,
    ) -> Result<String, DispatchError> {
        let resources = Resources::new(ram, cpu)?;
        let requested_size = vm::disk_size(disk_size)?;
        let (placement, size) = self.place_disk(disk_id, requested_size)?;

        let machine = VirtualMachine::new(
            Uuid::new_v4(),
            resources,
            BTreeMap::from([(placement.disk_id(), size)]),
        );
        self.fleet.record_vm(&machine, placement)?;
        self.registry.register(machine.clone())?;

        info!(
            target: DISPATCH_TARGET,
            vm_id = %machine.vm_id(),
            ram = resources.ram(),
            cpu = resources.cpu(),
            disk_id = %placement.disk_id(),
            "VM added"
        );
        Ok(machine.to_string())
    }

    /// Decides whether the new VM shares an existing disk or gets a new one.
    ///
    /// A supplied identifier that names no stored disk is replaced by a fresh
    /// one.
    fn place_disk(
        &self,
        disk_id: Option<Uuid>,
        requested_size: u64,
    ) -> Result<(DiskPlacement, u64), DispatchError> {
        if let Some(disk_id) = disk_id {
            if let Some(stored_size) = self.fleet.disk_size(disk_id)? {
                return Ok((DiskPlacement::Attach { disk_id }, stored_size));
            }
            debug!(
                target: DISPATCH_TARGET,
                %disk_id,
                "requested disk does not exist; creating a new one"
            );
        }
        let placement = DiskPlacement::Create {
            disk_id: Uuid::new_v4(),
            size: requested_size,
        };
        Ok((placement, requested_size))
    }

    fn update_vm(&self, vm_id: Uuid, ram: i64, cpu: i64) -> Result<String, DispatchError> {
        if self.registry.authenticated_connected(vm_id)?.is_none() {
            return Ok(response::vm_not_found(vm_id));
        }
        let resources = Resources::new(ram, cpu)?;
        let _serialised = self
            .update_lock
            .lock()
            .map_err(|_| DispatchError::UpdateLockPoisoned)?;
        if !self.fleet.update_vm_resources(vm_id, resources)? {
            return Ok(response::vm_not_found(vm_id));
        }
        match self.registry.update_ram_cpu(vm_id, resources)? {
            Some(_) => {
                info!(
                    target: DISPATCH_TARGET,
                    %vm_id,
                    ram = resources.ram(),
                    cpu = resources.cpu(),
                    "VM updated"
                );
                Ok(response::vm_updated(vm_id, resources))
            }
            None => Ok(response::vm_not_found(vm_id)),
        }
    }

    fn logout_vm(&self, vm_id: Uuid) -> Result<String, DispatchError> {
        if self.registry.unauthenticate(vm_id)? {
            info!(target: DISPATCH_TARGET, %vm_id, "VM logged out");
            Ok(response::vm_logged_out(vm_id))
        } else {
            Ok(response::vm_not_found(vm_id))
        }
    }

    fn list_disks(&self) -> Result<String, DispatchError> {
        let disks = self.fleet.list_disks()?;
        Ok(listing(
            disks
                .iter()
                .map(|disk| format!("Disk {}: {}", disk.id, disk.size)),
            response::NO_DISKS,
        ))
    }
}

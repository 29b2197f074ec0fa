//! In-process registry of connected, authenticated and historical VMs.
//!
//! All three structures live behind one mutex so every operation observes a
//! consistent view. Nothing ever removes an entry from the connected map or
//! the history map; only the authenticated set shrinks, via logout.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::vm::{Resources, VirtualMachine};

/// Errors raised by registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A thread panicked while holding the registry lock.
    #[error("VM registry lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct RegistryState {
    connected: BTreeMap<Uuid, VirtualMachine>,
    authenticated: BTreeSet<Uuid>,
    history: BTreeMap<Uuid, VirtualMachine>,
}

/// Shared VM registry.
#[derive(Debug, Default)]
pub struct VmRegistry {
    state: Mutex<RegistryState>,
}

impl VmRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>, RegistryError> {
        self.state.lock().map_err(|_| RegistryError::Poisoned)
    }

    /// Records a newly added VM in the connected map and the history map.
    pub fn register(&self, vm: VirtualMachine) -> Result<(), RegistryError> {
        let mut state = self.lock()?;
        state.history.insert(vm.vm_id(), vm.clone());
        state.connected.insert(vm.vm_id(), vm);
        Ok(())
    }

    /// Marks a VM identity as authenticated.
    ///
    /// The identity does not need to be registered yet.
    pub fn mark_authenticated(&self, vm_id: Uuid) -> Result<(), RegistryError> {
        self.lock()?.authenticated.insert(vm_id);
        Ok(())
    }

    /// Reports whether `vm_id` has passed authentication and not logged out.
    pub fn is_authenticated(&self, vm_id: Uuid) -> Result<bool, RegistryError> {
        Ok(self.lock()?.authenticated.contains(&vm_id))
    }

    /// Returns a copy of the connected VM record.
    pub fn get_connected(&self, vm_id: Uuid) -> Result<Option<VirtualMachine>, RegistryError> {
        Ok(self.lock()?.connected.get(&vm_id).cloned())
    }

    /// Returns the connected record for `vm_id` only when it is also
    /// authenticated.
    pub fn authenticated_connected(
        &self,
        vm_id: Uuid,
    ) -> Result<Option<VirtualMachine>, RegistryError> {
        let state = self.lock()?;
        if !state.authenticated.contains(&vm_id) {
            return Ok(None);
        }
        Ok(state.connected.get(&vm_id).cloned())
    }

    /// Applies new RAM and CPU figures to the connected and history records.
    ///
    /// Returns the updated connected record, or `None` when `vm_id` is not
    /// registered.
    pub fn update_ram_cpu(
        &self,
        vm_id: Uuid,
        resources: Resources,
    ) -> Result<Option<VirtualMachine>, RegistryError> {
        let mut state = self.lock()?;
        let Some(connected) = state.connected.get_mut(&vm_id) else {
            return Ok(None);
        };
        connected.set_resources(resources);
        let updated = connected.clone();
        if let Some(historical) = state.history.get_mut(&vm_id) {
            historical.set_resources(resources);
        }
        Ok(Some(updated))
    }

    /// Removes `vm_id` from the authenticated set.
    ///
    /// Returns `false` when the identity was not authenticated.
    pub fn unauthenticate(&self, vm_id: Uuid) -> Result<bool, RegistryError> {
        Ok(self.lock()?.authenticated.remove(&vm_id))
    }

    /// Snapshot of every connected VM ordered by identifier.
    pub fn connected(&self) -> Result<Vec<VirtualMachine>, RegistryError> {
        Ok(self.lock()?.connected.values().cloned().collect())
    }

    /// Snapshot of authenticated identities ordered by identifier.
    pub fn authenticated(&self) -> Result<Vec<Uuid>, RegistryError> {
        Ok(self.lock()?.authenticated.iter().copied().collect())
    }

    /// Snapshot of every VM ever registered ordered by identifier.
    pub fn history(&self) -> Result<Vec<VirtualMachine>, RegistryError> {
        Ok(self.lock()?.history.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rstest::{fixture, rstest};

    use super::*;

    fn vm(ram: i64, cpu: i64) -> VirtualMachine {
        VirtualMachine::new(
            Uuid::new_v4(),
            Resources::new(ram, cpu).expect("valid resources"),
            BTreeMap::from([(Uuid::new_v4(), 2048)]),
        )
    }

    #[fixture]
    fn registry() -> VmRegistry {
        VmRegistry::new()
    }

    #[rstest]
    fn registered_vm_is_connected_but_not_authenticated(registry: VmRegistry) {
        let machine = vm(1024, 4);
        registry.register(machine.clone()).expect("register");

        assert_eq!(
            registry.get_connected(machine.vm_id()).expect("lookup"),
            Some(machine.clone())
        );
        assert_eq!(registry.history().expect("history"), vec![machine.clone()]);
        assert!(!registry.is_authenticated(machine.vm_id()).expect("auth"));
    }

    #[rstest]
    fn update_changes_connected_and_history(registry: VmRegistry) {
        let machine = vm(1024, 4);
        registry.register(machine.clone()).expect("register");
        let resources = Resources::new(2048, 8).expect("valid resources");

        let updated = registry
            .update_ram_cpu(machine.vm_id(), resources)
            .expect("update")
            .expect("vm registered");

        assert_eq!(updated.resources(), resources);
        assert_eq!(updated.disks(), machine.disks());
        let history = registry.history().expect("history");
        assert_eq!(history[0].resources(), resources);
    }

    #[rstest]
    fn update_of_unknown_vm_reports_absence(registry: VmRegistry) {
        let resources = Resources::new(1, 1).expect("valid resources");
        assert_eq!(
            registry.update_ram_cpu(Uuid::new_v4(), resources).expect("update"),
            None
        );
    }

    #[rstest]
    fn logout_keeps_vm_registered(registry: VmRegistry) {
        let machine = vm(512, 2);
        registry.register(machine.clone()).expect("register");
        registry
            .mark_authenticated(machine.vm_id())
            .expect("authenticate");

        assert!(registry.unauthenticate(machine.vm_id()).expect("logout"));
        assert!(!registry.unauthenticate(machine.vm_id()).expect("logout again"));
        assert!(registry.authenticated().expect("authenticated").is_empty());
        assert_eq!(registry.connected().expect("connected").len(), 1);
        assert_eq!(registry.history().expect("history").len(), 1);
    }

    #[rstest]
    fn authenticated_lookup_requires_both_structures(registry: VmRegistry) {
        let machine = vm(512, 2);
        let stranger = Uuid::new_v4();
        registry.register(machine.clone()).expect("register");
        registry.mark_authenticated(stranger).expect("authenticate");

        assert_eq!(
            registry.authenticated_connected(machine.vm_id()).expect("lookup"),
            None
        );
        assert_eq!(registry.authenticated_connected(stranger).expect("lookup"), None);

        registry
            .mark_authenticated(machine.vm_id())
            .expect("authenticate");
        assert_eq!(
            registry.authenticated_connected(machine.vm_id()).expect("lookup"),
            Some(machine)
        );
    }

    #[test]
    fn concurrent_registrations_are_all_recorded() {
        let registry = Arc::new(VmRegistry::new());
        let workers: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.register(vm(64, 1)).expect("register"))
            })
            .collect();
        for worker in workers {
            worker.join().expect("join worker");
        }

        assert_eq!(registry.connected().expect("connected").len(), 16);
        assert_eq!(registry.history().expect("history").len(), 16);
    }
}

//! Simulated virtual machine records.
//!
//! A [`VirtualMachine`] is the unit tracked by the registry and persisted by
//! the store. Resource figures are validated on construction so a record in
//! memory always carries positive RAM, CPU and disk sizes.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Validation failures for VM resource figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VmValidationError {
    /// RAM must be greater than zero.
    #[error("ram must be positive, got {0}")]
    Ram(i64),
    /// CPU count must be greater than zero.
    #[error("cpu must be positive, got {0}")]
    Cpu(i64),
    /// Disk size must be greater than zero.
    #[error("disk size must be positive, got {0}")]
    DiskSize(i64),
}

/// Validated RAM and CPU allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resources {
    ram: u64,
    cpu: u64,
}

impl Resources {
    /// Validates raw figures as received on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`VmValidationError`] when either figure is zero or negative.
    pub fn new(ram: i64, cpu: i64) -> Result<Self, VmValidationError> {
        let ram = positive(ram).ok_or(VmValidationError::Ram(ram))?;
        let cpu = positive(cpu).ok_or(VmValidationError::Cpu(cpu))?;
        Ok(Self { ram, cpu })
    }

    /// Allocated RAM.
    #[must_use]
    pub const fn ram(&self) -> u64 {
        self.ram
    }

    /// Allocated CPU count.
    #[must_use]
    pub const fn cpu(&self) -> u64 {
        self.cpu
    }
}

/// Validates a raw disk size.
///
/// # Errors
///
/// Returns [`VmValidationError::DiskSize`] for zero or negative sizes.
pub fn disk_size(size: i64) -> Result<u64, VmValidationError> {
    positive(size).ok_or(VmValidationError::DiskSize(size))
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|value| *value > 0)
}

/// A simulated virtual machine and the disks attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMachine {
    vm_id: Uuid,
    resources: Resources,
    disks: BTreeMap<Uuid, u64>,
}

impl VirtualMachine {
    /// Assembles a VM from already validated parts.
    #[must_use]
    pub fn new(vm_id: Uuid, resources: Resources, disks: BTreeMap<Uuid, u64>) -> Self {
        Self {
            vm_id,
            resources,
            disks,
        }
    }

    /// Server-assigned identifier.
    #[must_use]
    pub const fn vm_id(&self) -> Uuid {
        self.vm_id
    }

    /// Current RAM and CPU allocation.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Attached disks keyed by disk identifier.
    #[must_use]
    pub const fn disks(&self) -> &BTreeMap<Uuid, u64> {
        &self.disks
    }

    /// Replaces the RAM and CPU allocation.
    pub fn set_resources(&mut self, resources: Resources) {
        self.resources = resources;
    }
}

impl fmt::Display for VirtualMachine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "VM {}: RAM={}, CPU={}, disks=[",
            self.vm_id,
            self.resources.ram(),
            self.resources.cpu()
        )?;
        for (index, (disk_id, size)) in self.disks.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{disk_id}={size}")?;
        }
        formatter.write_str("]")
    }
}

//! Parsing of decoded request lines into typed commands.

use uuid::Uuid;

/// A request line after tokenisation and argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    AddUser {
        login: String,
        secret: String,
    },
    ListUsers,
    Auth {
        vm_id: Uuid,
        login: String,
        secret: String,
    },
    AddVm {
        ram: i64,
        cpu: i64,
        disk_size: i64,
        disk_id: Option<Uuid>,
    },
    ListConnected,
    ListAuthenticated,
    ListAll,
    UpdateVm {
        vm_id: Uuid,
        ram: i64,
        cpu: i64,
    },
    LogoutVm {
        vm_id: Uuid,
    },
    ListDisks,
    /// Unknown name, wrong arity, or an argument that failed to parse.
    Unrecognized {
        name: String,
    },
}

impl Command {
    /// Parses one trimmed line. Returns `None` for blank lines.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        let args: Vec<&str> = tokens.collect();
        Some(Self::from_parts(name, &args).unwrap_or_else(|| Self::Unrecognized {
            name: name.to_owned(),
        }))
    }

    fn from_parts(name: &str, args: &[&str]) -> Option<Self> {
        let command = match (name, args) {
            ("ADD_USER", [login, secret]) => Self::AddUser {
                login: (*login).to_owned(),
                secret: (*secret).to_owned(),
            },
            ("LIST_USERS", []) => Self::ListUsers,
            ("AUTH", [vm_id, login, secret]) => Self::Auth {
                vm_id: uuid(vm_id)?,
                login: (*login).to_owned(),
                secret: (*secret).to_owned(),
            },
            ("ADD_VM", [ram, cpu, disk_size]) => Self::AddVm {
                ram: integer(ram)?,
                cpu: integer(cpu)?,
                disk_size: integer(disk_size)?,
                disk_id: None,
            },
            ("ADD_VM", [ram, cpu, disk_size, disk_id]) => Self::AddVm {
                ram: integer(ram)?,
                cpu: integer(cpu)?,
                disk_size: integer(disk_size)?,
                disk_id: Some(uuid(disk_id)?),
            },
            ("LIST_CON_VM", []) => Self::ListConnected,
            ("LIST_AU_VM", []) => Self::ListAuthenticated,
            ("LIST_ALL_VM", []) => Self::ListAll,
            ("UPDATE_VM", [vm_id, ram, cpu]) => Self::UpdateVm {
                vm_id: uuid(vm_id)?,
                ram: integer(ram)?,
                cpu: integer(cpu)?,
            },
            ("LOGOUT_VM", [vm_id]) => Self::LogoutVm {
                vm_id: uuid(vm_id)?,
            },
            ("LIST_DISKS", []) => Self::ListDisks,
            _ => return None,
        };
        Some(command)
    }

    /// Wire name of the command, used as a log field.
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::AddUser { .. } => "ADD_USER",
            Self::ListUsers => "LIST_USERS",
            Self::Auth { .. } => "AUTH",
            Self::AddVm { .. } => "ADD_VM",
            Self::ListConnected => "LIST_CON_VM",
            Self::ListAuthenticated => "LIST_AU_VM",
            Self::ListAll => "LIST_ALL_VM",
            Self::UpdateVm { .. } => "UPDATE_VM",
            Self::LogoutVm { .. } => "LOGOUT_VM",
            Self::ListDisks => "LIST_DISKS",
            Self::Unrecognized { name } => name,
        }
    }
}

fn integer(token: &str) -> Option<i64> {
    token.parse().ok()
}

fn uuid(token: &str) -> Option<Uuid> {
    Uuid::parse_str(token).ok()
}

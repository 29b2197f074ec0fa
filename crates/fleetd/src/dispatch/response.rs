//! Response text and the line writer used by sessions.

use std::fmt::Display;
use std::io::{self, Write};

use uuid::Uuid;

use crate::vm::Resources;

pub(crate) const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
pub(crate) const GENERIC_ERROR: &str = "ERROR: Something went wrong";
pub(crate) const AUTHENTICATE_SUCCESS: &str = "AUTHENTICATE_SUCCESS";
pub(crate) const AUTHENTICATE_FAIL: &str = "AUTHENTICATE_FAIL";
pub(crate) const USER_EXISTS: &str = "User already exists";
pub(crate) const NO_USERS: &str = "no users";
pub(crate) const NO_CONNECTED_VMS: &str = "no connect VM";
pub(crate) const NO_AUTHENTICATED_VMS: &str = "no authenticate VM";
pub(crate) const NO_REGISTERED_VMS: &str = "no VM registered";
pub(crate) const NO_DISKS: &str = "no disks";

pub(crate) fn user_created(login: &str) -> String {
    format!("User {login} created successfully")
}

pub(crate) fn vm_not_found(vm_id: Uuid) -> String {
    format!("VM {vm_id} not found")
}

pub(crate) fn vm_updated(vm_id: Uuid, resources: Resources) -> String {
    format!(
        "VM {vm_id} updated: RAM={}, CPU={}",
        resources.ram(),
        resources.cpu()
    )
}

pub(crate) fn vm_logged_out(vm_id: Uuid) -> String {
    format!("VM {vm_id} logged out")
}

/// Joins entries with `\n`, or answers `placeholder` when there are none.
pub(crate) fn listing<I>(entries: I, placeholder: &str) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let lines: Vec<String> = entries.into_iter().map(|entry| entry.to_string()).collect();
    if lines.is_empty() {
        placeholder.to_owned()
    } else {
        lines.join("\n")
    }
}

/// Writes newline-terminated responses and flushes after each one.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `response` followed by `\n` and flushes the stream.
    pub(crate) fn write_response(&mut self, response: &str) -> io::Result<()> {
        self.writer.write_all(response.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

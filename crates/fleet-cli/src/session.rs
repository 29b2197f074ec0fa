//! One command, one response over a daemon connection.
//!
//! The daemon terminates every response with `\n` but listings span several
//! lines, so a response is complete once a newline has arrived and the
//! daemon then stays silent for [`SETTLE_TIMEOUT`].

use std::io::{self, Read, Write};
use std::time::Duration;

use super::AppError;
use super::transport::Connection;

/// Longest wait for the first byte of a response.
pub(crate) const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Silence after a newline that ends a response.
pub(crate) const SETTLE_TIMEOUT: Duration = Duration::from_millis(100);

const READ_CHUNK: usize = 4096;

pub(crate) struct Session {
    connection: Connection,
    response_timeout: Duration,
}

impl Session {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            connection,
            response_timeout: RESPONSE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sends `command` as one line and returns the daemon's response text,
    /// newline included.
    pub(crate) fn exchange(&mut self, command: &str) -> Result<String, AppError> {
        self.send(command).map_err(AppError::SendCommand)?;
        self.read_response()
    }

    fn send(&mut self, command: &str) -> io::Result<()> {
        self.connection.write_all(command.as_bytes())?;
        self.connection.write_all(b"\n")?;
        self.connection.flush()
    }

    fn read_response(&mut self) -> Result<String, AppError> {
        let mut response = Vec::new();
        let mut chunk = [0_u8; READ_CHUNK];
        self.set_timeout(self.response_timeout)?;
        loop {
            match self.connection.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => {
                    response.extend_from_slice(&chunk[..count]);
                    if response.ends_with(b"\n") {
                        self.set_timeout(SETTLE_TIMEOUT)?;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    if response.is_empty() {
                        return Err(AppError::ResponseTimeout(self.response_timeout));
                    }
                    break;
                }
                Err(error) => return Err(AppError::ReadResponse(error)),
            }
        }

        if response.is_empty() {
            return Err(AppError::ServerClosed);
        }
        if !response.ends_with(b"\n") {
            response.push(b'\n');
        }
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    fn set_timeout(&self, timeout: Duration) -> Result<(), AppError> {
        self.connection
            .set_read_timeout(Some(timeout))
            .map_err(AppError::ReadResponse)
    }
}

//! Session loop that serves one client connection.
//!
//! A session reads newline-terminated commands until the client disconnects,
//! stays silent longer than the idle timeout, or the socket fails. Every
//! command gets exactly one response, written in arrival order.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::command::Command;
use super::framing::{LineReader, ReadOutcome};
use super::response::ResponseWriter;
use super::router::{CommandRouter, DISPATCH_TARGET};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    PeerClosed,
    IdleTimeout,
    ReadFailed,
    WriteFailed,
}

impl SessionEnd {
    fn as_str(self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::IdleTimeout => "idle_timeout",
            Self::ReadFailed => "read_failed",
            Self::WriteFailed => "write_failed",
        }
    }
}

/// Connection handler that runs the command session loop.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    router: CommandRouter,
    idle_timeout: Duration,
    message_limit: usize,
}

impl DispatchConnectionHandler {
    /// Creates a handler that serves sessions through `router`.
    pub fn new(router: CommandRouter, idle_timeout: Duration, message_limit: usize) -> Self {
        Self {
            router,
            idle_timeout,
            message_limit,
        }
    }

    fn serve(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        info!(target: DISPATCH_TARGET, %peer, "session opened");

        if let Err(error) = stream.set_read_timeout(Some(self.idle_timeout)) {
            warn!(target: DISPATCH_TARGET, %peer, %error, "failed to set idle timeout");
            return;
        }

        let end = self.run_session(&mut stream, &peer);
        info!(
            target: DISPATCH_TARGET,
            %peer,
            reason = end.as_str(),
            "session closed"
        );
    }

    fn run_session(&self, stream: &mut ConnectionStream, peer: &str) -> SessionEnd {
        let mut reader = LineReader::new(self.message_limit);
        loop {
            let bytes = match reader.next_line(stream) {
                Ok(ReadOutcome::Line(bytes)) => bytes,
                Ok(ReadOutcome::Closed) => return SessionEnd::PeerClosed,
                Ok(ReadOutcome::TimedOut) => return SessionEnd::IdleTimeout,
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %peer, %error, "failed to read command");
                    return SessionEnd::ReadFailed;
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            let Some(command) = Command::parse(text.trim()) else {
                continue;
            };
            debug!(target: DISPATCH_TARGET, %peer, command = command.name(), "command received");
            let response = self.router.route(command);

            if let Err(error) = ResponseWriter::new(&mut *stream).write_response(&response) {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to write response");
                return SessionEnd::WriteFailed;
            }
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.serve(stream);
    }
}

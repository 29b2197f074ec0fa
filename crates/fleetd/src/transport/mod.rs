//! Stream listener for client sessions.
//!
//! The listener binds the configured endpoint, accepts connections on a
//! background thread and runs each accepted connection on its own session
//! thread.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::PeerRecorder;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

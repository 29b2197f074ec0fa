//! Error types for socket listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding or running the session listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host did not resolve.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded without yielding an address.
    #[error("{endpoint} resolved to no addresses")]
    NoAddress { endpoint: String },
    /// The socket could not be bound.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to polling mode.
    #[error("failed to configure listener for {endpoint}: {source}")]
    Configure {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("failed to spawn accept thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
    /// Another process already answers on the socket path.
    #[cfg(unix)]
    #[error("{path} is already served by another process")]
    SocketInUse { path: String },
    /// Something other than a socket occupies the path.
    #[cfg(unix)]
    #[error("{path} exists and is not a socket")]
    NotASocket { path: String },
    /// A leftover socket file could not be inspected or removed.
    #[cfg(unix)]
    #[error("failed to {action} stale socket {path}: {source}")]
    StaleSocket {
        path: String,
        action: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("accept thread panicked")]
    ThreadPanic,
}

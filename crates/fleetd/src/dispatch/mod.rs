//! Line-protocol command dispatch.
//!
//! Clients send one command per line, fields separated by whitespace:
//!
//! ```text
//! ADD_USER alice secret1
//! AUTH 67e55044-10b1-426f-9247-bb680e5fe0c8 alice secret1
//! ADD_VM 1024 4 2048
//! ```
//!
//! Every non-blank line receives exactly one `\n`-terminated response.
//! Listings separate their entries with `\n` and answer a fixed placeholder
//! (`no users`, `no disks`, ...) when empty. Malformed lines answer
//! `UNKNOWN_COMMAND`; validation and storage failures answer
//! `ERROR: Something went wrong`. Neither ends the session.

mod command;
mod errors;
mod framing;
mod handler;
mod response;
mod router;

pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;
pub use self::router::CommandRouter;

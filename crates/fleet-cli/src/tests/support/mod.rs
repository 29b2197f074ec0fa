//! Test support utilities for fleet client coverage.

mod fake_daemon;

use std::ffi::OsString;
use std::process::ExitCode;

use fleet_config::{Config, SocketEndpoint};

use crate::{AppError, ConfigLoader, run_with_loader};

pub(super) use fake_daemon::{FakeDaemon, Reply};

/// Loader returning a configuration that targets a fixed endpoint.
pub(super) struct EndpointLoader {
    endpoint: SocketEndpoint,
}

impl EndpointLoader {
    pub(super) fn new(endpoint: SocketEndpoint) -> Self {
        Self { endpoint }
    }
}

impl ConfigLoader for EndpointLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(Config {
            listen_socket: self.endpoint.clone(),
            ..Config::default()
        })
    }
}

/// Captured result of one client run.
pub(super) struct ClientRun {
    pub(super) exit_code: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

/// Runs the client against `endpoint` with `args` after the program name and
/// `input` on stdin.
pub(super) fn run_client(endpoint: SocketEndpoint, args: &[&str], input: &str) -> ClientRun {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let args = std::iter::once("fleet")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit_code = run_with_loader(
        args,
        input.as_bytes(),
        &mut stdout,
        &mut stderr,
        &EndpointLoader::new(endpoint),
    );
    ClientRun {
        exit_code,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

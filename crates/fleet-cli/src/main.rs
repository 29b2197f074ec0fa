//! CLI entrypoint for the fleet client.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let input = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    fleet_cli::run(std::env::args_os(), input, &mut stdout, &mut stderr)
}

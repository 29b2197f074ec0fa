//! Interactive client for the fleet daemon.
//!
//! `fleet` resolves the same layered configuration as `fleetd`, connects to
//! its `listen_socket` and relays commands. Without positional arguments it
//! opens an interactive session: each line typed at the `> ` prompt is sent
//! as one command and the daemon's response is printed. Typing `exit` or
//! closing stdin ends the session. With positional arguments the words are
//! joined into a single command, sent once, and the client exits.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use fleet_config::SocketEndpoint;

mod config;
mod errors;
mod session;
mod transport;

use config::{ConfigArgumentSplit, ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;
use session::Session;
use transport::connect;

const PROMPT: &str = "> ";
const EXIT_COMMAND: &str = "exit";

/// Command-line interface for the fleet client.
#[derive(Parser, Debug)]
#[command(name = "fleet", about = "Interactive client for the fleet daemon")]
pub(crate) struct Cli {
    /// Command to send once instead of opening an interactive session
    /// (for example `LIST_USERS`).
    #[arg(
        value_name = "COMMAND",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub(crate) command: Vec<String>,
}

/// Runs the client with the supplied arguments and IO handles.
#[must_use]
pub fn run<I, R, W, E>(args: I, input: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, input, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    input: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match execute(args, input, stdout, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) => {
            let _ = write!(stderr, "{error}");
            ExitCode::FAILURE
        }
        Err(error) => {
            let _ = writeln!(stderr, "fleet: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, R, W, L>(args: I, input: R, stdout: &mut W, loader: &L) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = Cli::try_parse_from(cli_arguments(&args, &split)).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    let endpoint = config.listen_socket();
    let mut session = Session::new(connect(endpoint)?);

    if cli.command.is_empty() {
        interactive(&mut session, endpoint, input, stdout)
    } else {
        let response = session.exchange(&cli.command.join(" "))?;
        print_response(stdout, &response)
    }
}

fn cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| OsString::from("fleet"));
    std::iter::once(program)
        .chain(args.iter().skip(split.command_start).cloned())
        .collect()
}

fn interactive<R, W>(
    session: &mut Session,
    endpoint: &SocketEndpoint,
    mut input: R,
    output: &mut W,
) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Connected to fleet daemon at {endpoint}").map_err(AppError::WriteOutput)?;
    writeln!(output, "Type `{EXIT_COMMAND}` to quit.").map_err(AppError::WriteOutput)?;

    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")
            .and_then(|()| output.flush())
            .map_err(AppError::WriteOutput)?;
        line.clear();
        if input.read_line(&mut line).map_err(AppError::ReadInput)? == 0 {
            return Ok(());
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == EXIT_COMMAND {
            return Ok(());
        }
        let response = session.exchange(command)?;
        print_response(output, &response)?;
    }
}

fn print_response<W: Write>(output: &mut W, response: &str) -> Result<(), AppError> {
    output
        .write_all(response.as_bytes())
        .and_then(|()| output.flush())
        .map_err(AppError::WriteOutput)
}

#[cfg(test)]
mod tests;

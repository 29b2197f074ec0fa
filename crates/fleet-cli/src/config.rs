//! Configuration loading helpers for the fleet client.
//!
//! Leading configuration flags are handed to `ortho_config`; everything from
//! the first other token onwards is a command for the daemon.

use std::ffi::{OsStr, OsString};

use fleet_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// Flags understood by the configuration loader.
///
/// Kept in sync with the fields of [`fleet_config::Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--listen-socket",
    "--idle-timeout-secs",
    "--message-limit",
    "--database-path",
    "--database-pool-size",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

/// Configuration arguments (program name first) and the index of the first
/// command token.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 1;
    while let Some(argument) = args.get(index) {
        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                index += 1;
                if needs_value && let Some(value) = args.get(index) {
                    config_arguments.push(value.clone());
                    index += 1;
                }
            }
            FlagAction::Skip => break,
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start: index,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--listen-socket", FlagAction::Include { needs_value: true })]
    #[case("--verbose", FlagAction::Skip)]
    #[case("LIST_USERS", FlagAction::Skip)]
    fn classifies_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(process_config_flag(OsStr::new(argument)), expected);
    }

    #[test]
    fn config_flags_stop_at_first_command_token() {
        let args = os_args(&[
            "fleet",
            "--listen-socket",
            "tcp://127.0.0.1:9000",
            "--log-format=json",
            "ADD_USER",
            "--listen-socket",
            "x",
        ]);

        let split = split_config_arguments(&args);

        assert_eq!(
            split.config_arguments,
            os_args(&[
                "fleet",
                "--listen-socket",
                "tcp://127.0.0.1:9000",
                "--log-format=json",
            ])
        );
        assert_eq!(split.command_start, 4);
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert_eq!(split.command_start, 0);
    }

    #[test]
    fn trailing_flag_without_value_is_forwarded() {
        let split = split_config_arguments(&os_args(&["fleet", "--config-path"]));
        assert_eq!(split.config_arguments, os_args(&["fleet", "--config-path"]));
        assert_eq!(split.command_start, 2);
    }
}

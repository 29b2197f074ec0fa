use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output layout of daemon and client logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error returned when `--log-format` names an unknown layout.
pub type LogFormatParseError = strum::ParseError;

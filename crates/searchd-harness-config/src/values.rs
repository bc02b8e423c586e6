//! Small enums chosen by configuration: log format, bulk-load dialect and
//! database client.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Which database client carries SQL to the fixture store.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ClientKind {
    /// In-process MySQL driver.
    Native,
    /// The `mysql` command-line client, driven as a subprocess.
    Bridge,
}

/// Bulk-load statement dialect.
///
/// `Local` streams the file from the client (`LOAD DATA LOCAL INFILE`);
/// `Server` asks the server to open the path itself (`LOAD DATA INFILE`).
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LoadCommand {
    /// `LOAD DATA LOCAL INFILE`.
    #[default]
    Local,
    /// `LOAD DATA INFILE`.
    Server,
}

impl LoadCommand {
    /// SQL keyword prefix for the dialect.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Local => "LOAD DATA LOCAL INFILE",
            Self::Server => "LOAD DATA INFILE",
        }
    }

    /// Whether the client must stream the file contents.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

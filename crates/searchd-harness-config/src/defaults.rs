//! Default configuration values and the legacy environment fallbacks.

use std::env;

use camino::Utf8PathBuf;

use crate::values::{LoadCommand, LogFormat};

/// Fixture tree used when no directory is configured.
pub const DEFAULT_FIXTURES_DIR: &str = "spec/fixtures";

/// Database populated by the fixture loader.
pub const DEFAULT_DATABASE: &str = "riddle";

/// Executable driven by the bridge client.
pub const DEFAULT_MYSQL_CLIENT: &str = "mysql";

/// Readiness poll bound after launching `searchd`.
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 1_000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable naming the directory that holds the Sphinx binaries.
pub const LEGACY_BIN_ENV: &str = "SPHINX_BIN";

/// Environment variable set to `true` on CI hosts whose MySQL server reads
/// bulk-load files from its own filesystem.
pub const LEGACY_CI_ENV: &str = "TRAVIS";

/// Default fixture directory.
pub fn default_fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_FIXTURES_DIR)
}

/// Default database name.
pub fn default_database() -> String {
    DEFAULT_DATABASE.to_owned()
}

/// Default bridge client executable.
pub fn default_mysql_client() -> String {
    DEFAULT_MYSQL_CLIENT.to_owned()
}

/// Default readiness poll bound in milliseconds.
pub const fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_MS
}

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Reads `SPHINX_BIN`, ignoring an empty value.
pub fn legacy_sphinx_bin() -> Option<Utf8PathBuf> {
    env::var(LEGACY_BIN_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Utf8PathBuf::from)
}

/// Picks the bulk-load dialect from the `TRAVIS` flag.
pub fn legacy_load_command() -> LoadCommand {
    match env::var(LEGACY_CI_ENV) {
        Ok(value) if value == "true" => LoadCommand::Server,
        _ => LoadCommand::Local,
    }
}

//! Shared configuration for the searchd fixture harness.
//!
//! The harness prepares a MySQL store and a Sphinx `searchd` daemon for an
//! integration suite. Everything both halves agree on lives here: the layered
//! [`Config`], the fixture tree layout in [`FixturePaths`], database
//! [`Credentials`], and the small value enums that pick a backend or a
//! bulk-load dialect.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod credentials;
mod defaults;
mod paths;
mod values;

pub use credentials::{Credentials, CredentialsError};
pub use defaults::{
    DEFAULT_DATABASE, DEFAULT_FIXTURES_DIR, DEFAULT_LOG_FILTER, DEFAULT_MYSQL_CLIENT,
    DEFAULT_STARTUP_TIMEOUT_MS, LEGACY_BIN_ENV, LEGACY_CI_ENV, default_database,
    default_fixtures_dir, default_log_filter, default_log_filter_string, default_log_format,
    default_mysql_client, default_startup_timeout_ms, legacy_load_command, legacy_sphinx_bin,
};
pub use paths::FixturePaths;
pub use values::{ClientKind, LoadCommand, LogFormat};

/// Harness configuration, layered from defaults, an optional configuration
/// file, `SEARCHD_HARNESS_*` environment variables, and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SEARCHD_HARNESS")]
pub struct Config {
    /// Root of the fixture tree.
    #[serde(default = "default_fixtures_dir")]
    #[ortho_config(default = default_fixtures_dir())]
    pub fixtures_dir: Utf8PathBuf,
    /// Database created and populated during setup.
    #[serde(default = "default_database")]
    #[ortho_config(default = default_database())]
    pub database: String,
    /// Directory holding the `indexer` and `searchd` executables.
    #[serde(default)]
    pub sphinx_bin: Option<Utf8PathBuf>,
    /// Daemon version used to pick the stop flag; detected when unset.
    #[serde(default)]
    pub sphinx_version: Option<String>,
    /// Bulk-load dialect; derived from the CI environment when unset.
    #[serde(default)]
    pub load_command: Option<LoadCommand>,
    /// Database client backend; derived from the compiled drivers when unset.
    #[serde(default)]
    pub db_client: Option<ClientKind>,
    /// Executable used by the bridge client.
    #[serde(default = "default_mysql_client")]
    #[ortho_config(default = default_mysql_client())]
    pub mysql_client: String,
    /// Upper bound on the post-launch readiness poll, in milliseconds.
    #[serde(default = "default_startup_timeout_ms")]
    #[ortho_config(default = default_startup_timeout_ms())]
    pub startup_timeout_ms: u64,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixtures_dir: default_fixtures_dir(),
            database: default_database(),
            sphinx_bin: None,
            sphinx_version: None,
            load_command: None,
            db_client: None,
            mysql_client: default_mysql_client(),
            startup_timeout_ms: default_startup_timeout_ms(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Root of the fixture tree.
    #[must_use]
    pub fn fixtures_dir(&self) -> &Utf8Path {
        self.fixtures_dir.as_path()
    }

    /// Fixture layout derived from [`Self::fixtures_dir`].
    #[must_use]
    pub fn fixture_paths(&self) -> FixturePaths {
        FixturePaths::new(self.fixtures_dir.clone())
    }

    /// Name of the fixture database.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    /// Directory holding the Sphinx executables.
    ///
    /// Falls back to the `SPHINX_BIN` environment variable so existing CI
    /// setups keep working; `None` means the binaries are resolved on `PATH`.
    #[must_use]
    pub fn sphinx_bin(&self) -> Option<Utf8PathBuf> {
        self.sphinx_bin.clone().or_else(legacy_sphinx_bin)
    }

    /// Configured daemon version, if one was supplied.
    #[must_use]
    pub fn sphinx_version(&self) -> Option<&str> {
        self.sphinx_version.as_deref()
    }

    /// Bulk-load dialect, falling back to the `TRAVIS` environment flag.
    #[must_use]
    pub fn load_command(&self) -> LoadCommand {
        self.load_command.unwrap_or_else(legacy_load_command)
    }

    /// Explicit backend choice, if one was configured.
    #[must_use]
    pub const fn db_client(&self) -> Option<ClientKind> {
        self.db_client
    }

    /// Executable used by the bridge client.
    #[must_use]
    pub fn mysql_client(&self) -> &str {
        self.mysql_client.as_str()
    }

    /// Upper bound on the post-launch readiness poll.
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

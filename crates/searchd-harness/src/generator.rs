//! Renders the daemon configuration from the fixture template.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use searchd_harness_config::{Credentials, FixturePaths};
use tempfile::Builder;
use thiserror::Error;
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const GENERATOR_TARGET: &str = "searchd_harness::generator";

/// Errors raised while generating the daemon configuration.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The template could not be read.
    #[error("failed to read configuration template {path}: {source}")]
    ReadTemplate {
        /// Template path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The rendered configuration could not be written.
    #[error("failed to write configuration {path}: {source}")]
    Write {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The binlog directory could not be created.
    #[error("failed to create binlog directory {path}: {source}")]
    Binlog {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
}

/// Writes `sphinx/spec.conf` from `sphinx/configuration.template`.
#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    paths: FixturePaths,
    database: String,
}

impl ConfigGenerator {
    /// Generator for the fixture tree at `paths` targeting `database`.
    #[must_use]
    pub fn new(paths: FixturePaths, database: impl Into<String>) -> Self {
        Self {
            paths,
            database: database.into(),
        }
    }

    /// Renders the template, writes the configuration atomically, creates
    /// the binlog directory, and returns the configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] when the template cannot be read or an
    /// output cannot be written.
    pub fn generate(&self, credentials: &Credentials) -> Result<Utf8PathBuf, GenerateError> {
        let template_path = self.paths.template_path();
        let template =
            fs::read_to_string(&template_path).map_err(|source| GenerateError::ReadTemplate {
                path: template_path.clone(),
                source,
            })?;
        let rendered = self.render(&template, credentials);
        let config_path = self.paths.config_path();
        atomic_write(config_path.as_std_path(), rendered.as_bytes()).map_err(|source| {
            GenerateError::Write {
                path: config_path.clone(),
                source,
            }
        })?;
        let binlog = self.paths.binlog_dir();
        fs::create_dir_all(&binlog).map_err(|source| GenerateError::Binlog {
            path: binlog.clone(),
            source,
        })?;
        info!(target: GENERATOR_TARGET, path = %config_path, "wrote daemon configuration");
        Ok(config_path)
    }

    /// Substitutes the known `{{placeholders}}`; anything else is kept as is.
    #[must_use]
    pub fn render(&self, template: &str, credentials: &Credentials) -> String {
        let fixtures = absolute(self.paths.root());
        [
            ("{{host}}", credentials.host()),
            ("{{username}}", credentials.username()),
            ("{{password}}", credentials.password()),
            ("{{database}}", self.database.as_str()),
            ("{{fixtures_path}}", fixtures.as_str()),
        ]
        .into_iter()
        .fold(template.to_owned(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
    }
}

/// The daemon resolves relative paths from its own working directory, so
/// the fixture root is made absolute when the current directory is known.
fn absolute(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .ok()
        .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
        .map_or_else(|| path.to_path_buf(), |cwd| cwd.join(path))
}

fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("spec.conf"),
    );
    #[cfg(unix)]
    builder.permissions(fs::Permissions::from_mode(0o644));

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

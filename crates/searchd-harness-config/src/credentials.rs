//! Database credentials read from the optional fixture `conf.yml`.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_USERNAME: &str = "root";

/// Connection parameters for the fixture database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    host: String,
    username: String,
    password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            username: DEFAULT_USERNAME.to_owned(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Errors raised while loading credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The file existed but could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The file was not valid YAML for the expected keys.
    #[error("failed to parse credentials file {path}: {message}")]
    Parse {
        /// Offending path.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

impl Credentials {
    /// Builds credentials from explicit values.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Loads credentials from `path`, falling back to local defaults when the
    /// file is absent. Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, CredentialsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CredentialsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content).map_err(|message| CredentialsError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: CredentialsFile =
            serde_saphyr::from_str(content).map_err(|error| error.to_string())?;
        let defaults = Self::default();
        Ok(Self {
            host: file.host.unwrap_or(defaults.host),
            username: file.username.unwrap_or(defaults.username),
            password: file.password.unwrap_or(defaults.password),
        })
    }

    /// Database host.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Database user.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Database password; empty when none is required.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

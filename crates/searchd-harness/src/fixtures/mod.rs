//! Loads the fixture schema and bulk data into MySQL.
//!
//! [`FixtureLoader::setup`] runs a fixed sequence against whichever
//! [`Connector`] it was built with: connect, ensure the database exists,
//! select it, run the schema statements in file order, then stage and
//! bulk-load each data file in spec order. The first failure aborts the rest.
//! The session and every staged copy are released on all exit paths because
//! both are owned values dropped at scope end.
//!
//! Building the Sphinx index is not part of setup; that belongs to the
//! daemon controller.

use std::fmt;
use std::fs;
use std::io;

use camino::Utf8PathBuf;
use searchd_harness_config::Credentials;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::{Connector, DatabaseBackend, DatabaseError, sql};

mod spec;
mod staging;

pub use spec::{BulkDataFile, FixtureSpec, ManifestError};
pub use staging::{StagedFile, StagingArea};

const FIXTURES_TARGET: &str = "searchd_harness::fixtures";

/// Setup step that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStep {
    /// Opening the session.
    Connect,
    /// Listing or creating the fixture database.
    EnsureDatabase,
    /// Selecting the fixture database.
    SelectDatabase,
    /// Executing a schema statement (1-based position in the file).
    Schema {
        /// Statement position.
        index: usize,
    },
    /// Bulk-loading a table.
    BulkLoad {
        /// Target table.
        table: String,
    },
}

impl fmt::Display for SetupStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => formatter.write_str("connect"),
            Self::EnsureDatabase => formatter.write_str("ensure database"),
            Self::SelectDatabase => formatter.write_str("select database"),
            Self::Schema { index } => write!(formatter, "schema statement {index}"),
            Self::BulkLoad { table } => write!(formatter, "bulk load into {table}"),
        }
    }
}

/// Errors raised by [`FixtureLoader::setup`].
#[derive(Debug, Error)]
pub enum SetupError {
    /// A database operation failed.
    #[error("fixture setup failed during {step}: {source}")]
    Database {
        /// Step that failed.
        step: SetupStep,
        /// Backend failure.
        #[source]
        source: DatabaseError,
    },
    /// The schema file could not be read.
    #[error("failed to read schema {path}: {source}")]
    ReadSchema {
        /// Schema path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// A data file could not be staged for the server.
    #[error("failed to stage fixture file {path}: {source}")]
    Stage {
        /// Source data file.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    fn database(step: SetupStep) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self::Database { step, source }
    }
}

/// Rows loaded into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    /// Target table.
    pub table: String,
    /// Rows reported by the server.
    pub rows: u64,
}

/// Summary of a successful setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// Whether this run created the database.
    pub created_database: bool,
    /// Schema statements executed.
    pub statements: usize,
    /// Bulk loads in spec order.
    pub loaded: Vec<LoadedTable>,
}

/// Populates the fixture database through a [`Connector`].
#[derive(Debug, Clone)]
pub struct FixtureLoader<C> {
    connector: C,
    database: String,
    staging: StagingArea,
}

impl<C: Connector> FixtureLoader<C> {
    /// Builds a loader targeting `database`, staging into the system
    /// temporary directory.
    #[must_use]
    pub fn new(connector: C, database: impl Into<String>) -> Self {
        Self {
            connector,
            database: database.into(),
            staging: StagingArea::system(),
        }
    }

    /// Overrides where data files are staged.
    #[must_use]
    pub fn with_staging(mut self, staging: StagingArea) -> Self {
        self.staging = staging;
        self
    }

    /// Loads schema and data described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] for the first step that fails; later steps are
    /// not attempted. "Database already exists" is not an error.
    pub fn setup(
        &self,
        credentials: &Credentials,
        spec: &FixtureSpec,
    ) -> Result<SetupReport, SetupError> {
        let mut backend = self
            .connector
            .connect(credentials)
            .map_err(SetupError::database(SetupStep::Connect))?;
        let created_database = self.ensure_database(&mut backend)?;
        backend
            .select_database(&self.database)
            .map_err(SetupError::database(SetupStep::SelectDatabase))?;
        let statements = load_schema(&mut backend, spec)?;
        let mut loaded = Vec::with_capacity(spec.bulk_data().len());
        for file in spec.bulk_data() {
            loaded.push(self.load_file(&mut backend, file)?);
        }
        info!(
            target: FIXTURES_TARGET,
            database = %self.database,
            created_database,
            statements,
            tables = loaded.len(),
            "fixture database ready"
        );
        Ok(SetupReport {
            created_database,
            statements,
            loaded,
        })
    }

    fn ensure_database(&self, backend: &mut C::Backend) -> Result<bool, SetupError> {
        let databases = backend
            .list_databases()
            .map_err(SetupError::database(SetupStep::EnsureDatabase))?;
        if databases.contains(&self.database) {
            debug!(target: FIXTURES_TARGET, database = %self.database, "database already present");
            return Ok(false);
        }
        match backend.create_database(&self.database) {
            Ok(()) => Ok(true),
            Err(error) if error.is_already_exists() => {
                debug!(target: FIXTURES_TARGET, database = %self.database, "database created concurrently");
                Ok(false)
            }
            Err(source) => Err(SetupError::Database {
                step: SetupStep::EnsureDatabase,
                source,
            }),
        }
    }

    fn load_file(
        &self,
        backend: &mut C::Backend,
        file: &BulkDataFile,
    ) -> Result<LoadedTable, SetupError> {
        let staged = self
            .staging
            .stage(file.path())
            .map_err(|source| SetupError::Stage {
                path: file.path().to_path_buf(),
                source,
            })?;
        debug!(
            target: FIXTURES_TARGET,
            table = file.table(),
            source = %file.path(),
            staged = %staged.path().display(),
            "staged fixture file"
        );
        let rows = backend
            .bulk_load(staged.path(), &file.request())
            .map_err(SetupError::database(SetupStep::BulkLoad {
                table: file.table().to_owned(),
            }))?;
        info!(target: FIXTURES_TARGET, table = file.table(), rows, "bulk load complete");
        Ok(LoadedTable {
            table: file.table().to_owned(),
            rows,
        })
    }
}

fn load_schema<B: DatabaseBackend>(backend: &mut B, spec: &FixtureSpec) -> Result<usize, SetupError> {
    let script = fs::read_to_string(spec.schema()).map_err(|source| SetupError::ReadSchema {
        path: spec.schema().to_path_buf(),
        source,
    })?;
    let statements = sql::split_statements(&script);
    for (position, statement) in statements.iter().enumerate() {
        backend
            .execute(statement)
            .map_err(SetupError::database(SetupStep::Schema {
                index: position + 1,
            }))?;
    }
    Ok(statements.len())
}

//! Database clients used to load fixtures into MySQL.
//!
//! Two clients implement the same [`DatabaseBackend`] contract:
//! - [`BridgeClient`] drives the `mysql` command-line client.
//! - `NativeClient` talks to the server in-process through the `mysql` crate
//!   and is only compiled with the `native-client` feature.
//!
//! [`DatabaseClient`] is the tagged choice between them, resolved once from
//! [`ClientSettings`] when a connection is opened. Both clients build their
//! SQL through [`sql`] and classify failures through [`DatabaseError`], so the
//! fixture loader sees identical behaviour whichever one is active.

use std::collections::BTreeSet;
use std::path::Path;

use searchd_harness_config::{ClientKind, Config, Credentials, LoadCommand};
use tracing::debug;

mod bridge;
mod error;
#[cfg(feature = "native-client")]
mod native;
pub mod sql;

pub use bridge::BridgeClient;
pub use error::DatabaseError;
#[cfg(feature = "native-client")]
pub use native::NativeClient;

const DATABASE_TARGET: &str = "searchd_harness::database";

/// Table, column, and field framing for one bulk load.
#[derive(Debug, Clone, Copy)]
pub struct BulkLoad<'a> {
    /// Target table in the selected database.
    pub table: &'a str,
    /// Columns receiving the file's fields, in file order.
    pub columns: &'a [String],
    /// Field separator.
    pub delimiter: char,
    /// Character enclosing quoted fields.
    pub quote: char,
}

/// Operations the fixture loader needs from a database session.
pub trait DatabaseBackend {
    /// Lists the databases visible to the session.
    fn list_databases(&mut self) -> Result<BTreeSet<String>, DatabaseError>;

    /// Creates `name`, failing with [`DatabaseError::AlreadyExists`] when it
    /// is already present.
    fn create_database(&mut self, name: &str) -> Result<(), DatabaseError>;

    /// Makes `name` the default database for subsequent statements.
    fn select_database(&mut self, name: &str) -> Result<(), DatabaseError>;

    /// Executes a single statement.
    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Bulk-loads the file at `path` and returns the number of rows loaded.
    fn bulk_load(&mut self, path: &Path, request: &BulkLoad<'_>) -> Result<u64, DatabaseError>;

    /// Counts the rows in `table`.
    fn count_rows(&mut self, table: &str) -> Result<u64, DatabaseError>;
}

/// Opens backend sessions from credentials.
pub trait Connector {
    /// Session type produced by this connector.
    type Backend: DatabaseBackend;

    /// Connects using `credentials`.
    fn connect(&self, credentials: &Credentials) -> Result<Self::Backend, DatabaseError>;
}

impl<T: Connector + ?Sized> Connector for &T {
    type Backend = T::Backend;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Backend, DatabaseError> {
        (**self).connect(credentials)
    }
}

/// Client choice fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    kind: ClientKind,
    load_command: LoadCommand,
    mysql_client: String,
}

impl ClientSettings {
    /// Builds settings from explicit values.
    #[must_use]
    pub fn new(kind: ClientKind, load_command: LoadCommand, mysql_client: impl Into<String>) -> Self {
        Self {
            kind,
            load_command,
            mysql_client: mysql_client.into(),
        }
    }

    /// Resolves settings from configuration, defaulting the client to the
    /// drivers compiled into this binary.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.db_client().unwrap_or_else(compiled_client_kind),
            config.load_command(),
            config.mysql_client(),
        )
    }

    /// Selected client.
    #[must_use]
    pub const fn kind(&self) -> ClientKind {
        self.kind
    }

    /// Selected bulk-load dialect.
    #[must_use]
    pub const fn load_command(&self) -> LoadCommand {
        self.load_command
    }
}

/// Client used when configuration does not name one.
#[must_use]
pub const fn compiled_client_kind() -> ClientKind {
    if cfg!(feature = "native-client") {
        ClientKind::Native
    } else {
        ClientKind::Bridge
    }
}

impl Connector for ClientSettings {
    type Backend = DatabaseClient;

    fn connect(&self, credentials: &Credentials) -> Result<DatabaseClient, DatabaseError> {
        DatabaseClient::connect(self, credentials)
    }
}

/// A connected session on whichever client was selected.
#[derive(Debug)]
pub enum DatabaseClient {
    /// In-process driver session.
    #[cfg(feature = "native-client")]
    Native(NativeClient),
    /// Command-line client session.
    Bridge(BridgeClient),
}

impl DatabaseClient {
    /// Connects with the client named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] when the server is unreachable or
    /// rejects the credentials, and [`DatabaseError::Unsupported`] when the
    /// requested client was not compiled in.
    pub fn connect(
        settings: &ClientSettings,
        credentials: &Credentials,
    ) -> Result<Self, DatabaseError> {
        debug!(
            target: DATABASE_TARGET,
            client = %settings.kind,
            load_command = %settings.load_command,
            host = credentials.host(),
            user = credentials.username(),
            "connecting to fixture database"
        );
        match settings.kind {
            ClientKind::Native => {
                #[cfg(feature = "native-client")]
                {
                    NativeClient::connect(credentials, settings.load_command).map(Self::Native)
                }
                #[cfg(not(feature = "native-client"))]
                {
                    Err(DatabaseError::Unsupported {
                        kind: ClientKind::Native,
                    })
                }
            }
            ClientKind::Bridge => BridgeClient::connect(
                settings.mysql_client.as_str(),
                credentials,
                settings.load_command,
            )
            .map(Self::Bridge),
        }
    }

    fn backend(&mut self) -> &mut dyn DatabaseBackend {
        match self {
            #[cfg(feature = "native-client")]
            Self::Native(client) => client,
            Self::Bridge(client) => client,
        }
    }
}

impl DatabaseBackend for DatabaseClient {
    fn list_databases(&mut self) -> Result<BTreeSet<String>, DatabaseError> {
        self.backend().list_databases()
    }

    fn create_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.backend().create_database(name)
    }

    fn select_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.backend().select_database(name)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.backend().execute(sql)
    }

    fn bulk_load(&mut self, path: &Path, request: &BulkLoad<'_>) -> Result<u64, DatabaseError> {
        self.backend().bulk_load(path, request)
    }

    fn count_rows(&mut self, table: &str) -> Result<u64, DatabaseError> {
        self.backend().count_rows(table)
    }
}

//! Error surface shared by both database clients.
//!
//! Each client reports the server error code it received (if any) and the
//! operation it was attempting; [`DatabaseError::classify`] turns that pair
//! into the same variant regardless of which client produced it.

use std::io;

use searchd_harness_config::ClientKind;
use thiserror::Error;

/// Server code for `CREATE DATABASE` on an existing database.
pub(crate) const ER_DB_CREATE_EXISTS: u16 = 1007;

/// Server and client codes that mean the session never became usable.
const CONNECTION_CODES: &[u16] = &[
    1044, // access denied to database
    1045, // access denied for user
    2002, // cannot connect through socket
    2003, // cannot connect to host
    2005, // unknown host
    2013, // lost connection during query
];

/// What a client was doing when the server rejected it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation<'a> {
    Connect { host: &'a str },
    CreateDatabase { name: &'a str },
    Statement { sql: &'a str },
    Load { table: &'a str },
}

/// Errors raised by a [`DatabaseBackend`](super::DatabaseBackend).
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The host was unreachable or rejected the credentials.
    #[error("failed to connect to MySQL at {host}: {message}")]
    Connection {
        /// Host the client tried to reach.
        host: String,
        /// Server or transport diagnostic.
        message: String,
    },
    /// `CREATE DATABASE` found the database already present.
    #[error("database {name} already exists")]
    AlreadyExists {
        /// Database name.
        name: String,
    },
    /// A DDL or DML statement failed.
    #[error("statement failed{}: {message}\n  {statement}", code_suffix(.code))]
    Sql {
        /// Statement text, trimmed.
        statement: String,
        /// Server error code, when the server supplied one.
        code: Option<u16>,
        /// Server diagnostic.
        message: String,
    },
    /// The server rejected a bulk load.
    #[error("bulk load into {table} failed{}: {message}", code_suffix(.code))]
    Load {
        /// Target table.
        table: String,
        /// Server error code, when the server supplied one.
        code: Option<u16>,
        /// Server diagnostic.
        message: String,
    },
    /// The client executable could not be launched.
    #[error("failed to launch database client '{program}': {source}")]
    ClientUnavailable {
        /// Executable name or path.
        program: String,
        /// Spawn failure.
        #[source]
        source: io::Error,
    },
    /// The client returned output the harness could not interpret.
    #[error("unexpected output from database client: {output}")]
    UnexpectedOutput {
        /// Offending output, trimmed.
        output: String,
    },
    /// The requested client was not compiled into this binary.
    #[error("the {kind} database client is not available in this build")]
    Unsupported {
        /// Requested client.
        kind: ClientKind,
    },
}

fn code_suffix(code: &Option<u16>) -> String {
    code.map(|value| format!(" (error {value})"))
        .unwrap_or_default()
}

impl DatabaseError {
    /// Maps a server rejection onto the shared taxonomy.
    pub(crate) fn classify(
        operation: Operation<'_>,
        code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let connection_failure = code.is_some_and(|value| CONNECTION_CODES.contains(&value));
        match operation {
            Operation::Connect { host } => Self::Connection {
                host: host.to_owned(),
                message,
            },
            _ if connection_failure => Self::Connection {
                host: String::from("server"),
                message,
            },
            Operation::CreateDatabase { name } if code == Some(ER_DB_CREATE_EXISTS) => {
                Self::AlreadyExists {
                    name: name.to_owned(),
                }
            }
            Operation::CreateDatabase { name } => Self::Sql {
                statement: format!("CREATE DATABASE {name}"),
                code,
                message,
            },
            Operation::Statement { sql } => Self::Sql {
                statement: sql.trim().to_owned(),
                code,
                message,
            },
            Operation::Load { table } => Self::Load {
                table: table.to_owned(),
                code,
                message,
            },
        }
    }

    /// Whether this is the tolerated "database already exists" case.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

//! In-process database access through the `mysql` crate.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use mysql::prelude::Queryable;
use mysql::{Conn, LocalInfileHandler, OptsBuilder};
use searchd_harness_config::{Credentials, LoadCommand};
use tracing::debug;

use super::error::{DatabaseError, Operation};
use super::{BulkLoad, DATABASE_TARGET, DatabaseBackend, sql};

/// Session backed by the in-process MySQL driver.
pub struct NativeClient {
    conn: Conn,
    load_command: LoadCommand,
}

impl fmt::Debug for NativeClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("NativeClient")
            .field("connection_id", &self.conn.connection_id())
            .field("load_command", &self.load_command)
            .finish()
    }
}

impl NativeClient {
    /// Opens a session without selecting a database.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] when the server is unreachable or
    /// rejects the credentials.
    pub fn connect(
        credentials: &Credentials,
        load_command: LoadCommand,
    ) -> Result<Self, DatabaseError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(credentials.host()))
            .user(Some(credentials.username()))
            .pass(Some(credentials.password()))
            .local_infile_handler(Some(LocalInfileHandler::new(stream_local_file)));
        let conn = Conn::new(opts).map_err(|error| {
            map_error(
                Operation::Connect {
                    host: credentials.host(),
                },
                &error,
            )
        })?;
        Ok(Self { conn, load_command })
    }
}

/// Streams a file requested by `LOAD DATA LOCAL INFILE` to the server.
fn stream_local_file(file_name: &[u8], writer: &mut mysql::LocalInfile<'_>) -> io::Result<()> {
    let path = String::from_utf8_lossy(file_name).into_owned();
    let mut file = File::open(&path)?;
    io::copy(&mut file, writer)?;
    writer.flush()
}

fn map_error(operation: Operation<'_>, error: &mysql::Error) -> DatabaseError {
    match error {
        mysql::Error::MySqlError(server) => {
            DatabaseError::classify(operation, Some(server.code), server.message.clone())
        }
        other => DatabaseError::classify(operation, None, other.to_string()),
    }
}

impl DatabaseBackend for NativeClient {
    fn list_databases(&mut self) -> Result<BTreeSet<String>, DatabaseError> {
        let names: Vec<String> = self.conn.query(sql::SHOW_DATABASES).map_err(|error| {
            map_error(
                Operation::Statement {
                    sql: sql::SHOW_DATABASES,
                },
                &error,
            )
        })?;
        Ok(names.into_iter().collect())
    }

    fn create_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.conn
            .query_drop(sql::create_database(name))
            .map_err(|error| map_error(Operation::CreateDatabase { name }, &error))
    }

    fn select_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        let statement = sql::use_database(name);
        self.conn
            .query_drop(&statement)
            .map_err(|error| map_error(Operation::Statement { sql: &statement }, &error))
    }

    fn execute(&mut self, statement: &str) -> Result<(), DatabaseError> {
        self.conn
            .query_drop(statement)
            .map_err(|error| map_error(Operation::Statement { sql: statement }, &error))
    }

    fn bulk_load(&mut self, path: &Path, request: &BulkLoad<'_>) -> Result<u64, DatabaseError> {
        let statement = sql::load_data(self.load_command, path, request);
        self.conn.query_drop(&statement).map_err(|error| {
            map_error(
                Operation::Load {
                    table: request.table,
                },
                &error,
            )
        })?;
        let rows = self.conn.affected_rows();
        debug!(target: DATABASE_TARGET, table = request.table, rows, "native bulk load finished");
        Ok(rows)
    }

    fn count_rows(&mut self, table: &str) -> Result<u64, DatabaseError> {
        let statement = sql::count_rows(table);
        let count: Option<u64> = self
            .conn
            .query_first(&statement)
            .map_err(|error| map_error(Operation::Statement { sql: &statement }, &error))?;
        count.ok_or(DatabaseError::UnexpectedOutput {
            output: format!("no rows returned by {statement}"),
        })
    }
}

//! Database access through the `mysql` command-line client.
//!
//! Every call runs the client once in batch mode. The client keeps no session
//! between calls, so the selected database travels as `--database` on each
//! invocation and the password travels in `MYSQL_PWD` rather than argv.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use searchd_harness_config::{Credentials, LoadCommand};
use tracing::{debug, trace};

use super::error::{DatabaseError, Operation};
use super::{BulkLoad, DATABASE_TARGET, DatabaseBackend, sql};

/// Session backed by the `mysql` command-line client.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    program: String,
    credentials: Credentials,
    load_command: LoadCommand,
    database: Option<String>,
}

impl BridgeClient {
    /// Verifies the credentials with a trivial query and returns the session.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ClientUnavailable`] when the client cannot be
    /// launched and [`DatabaseError::Connection`] when the server refuses the
    /// session.
    pub fn connect(
        program: &str,
        credentials: &Credentials,
        load_command: LoadCommand,
    ) -> Result<Self, DatabaseError> {
        let client = Self {
            program: program.to_owned(),
            credentials: credentials.clone(),
            load_command,
            database: None,
        };
        client.run(
            "SELECT 1",
            Operation::Connect {
                host: credentials.host(),
            },
        )?;
        Ok(client)
    }

    fn arguments(&self, statement: &str) -> Vec<OsString> {
        let mut arguments = vec![
            OsString::from(format!("--host={}", self.credentials.host())),
            OsString::from(format!("--user={}", self.credentials.username())),
            OsString::from("--batch"),
            OsString::from("--skip-column-names"),
        ];
        if self.load_command.is_local() {
            arguments.push(OsString::from("--local-infile=1"));
        }
        if let Some(database) = &self.database {
            arguments.push(OsString::from(format!("--database={database}")));
        }
        arguments.push(OsString::from("--execute"));
        arguments.push(OsString::from(statement));
        arguments
    }

    fn run(&self, statement: &str, operation: Operation<'_>) -> Result<String, DatabaseError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.arguments(statement))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !self.credentials.password().is_empty() {
            command.env("MYSQL_PWD", self.credentials.password());
        }
        trace!(target: DATABASE_TARGET, program = %self.program, statement, "running mysql client");
        let output = command
            .output()
            .map_err(|source| DatabaseError::ClientUnavailable {
                program: self.program.clone(),
                source,
            })?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let (code, message) = parse_client_error(&stderr);
        Err(DatabaseError::classify(operation, code, message))
    }
}

/// Extracts the server code from client output such as
/// `ERROR 1007 (HY000) at line 1: Can't create database 'riddle'`.
fn parse_client_error(stderr: &str) -> (Option<u16>, String) {
    let line = stderr
        .lines()
        .find(|line| line.trim_start().starts_with("ERROR "))
        .or_else(|| stderr.lines().find(|line| !line.trim().is_empty()))
        .unwrap_or_default()
        .trim();
    let code = line
        .strip_prefix("ERROR ")
        .map(|rest| {
            rest.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse::<u16>().ok());
    let message = line
        .split_once(": ")
        .map_or(line, |(_, message)| message)
        .to_owned();
    (code, message)
}

fn parse_count(output: &str) -> Result<u64, DatabaseError> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<u64>().ok())
        .ok_or_else(|| DatabaseError::UnexpectedOutput {
            output: output.trim().to_owned(),
        })
}

impl DatabaseBackend for BridgeClient {
    fn list_databases(&mut self) -> Result<BTreeSet<String>, DatabaseError> {
        let output = self.run(
            sql::SHOW_DATABASES,
            Operation::Statement {
                sql: sql::SHOW_DATABASES,
            },
        )?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn create_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.run(&sql::create_database(name), Operation::CreateDatabase { name })
            .map(|_| ())
    }

    fn select_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        let statement = sql::use_database(name);
        self.run(&statement, Operation::Statement { sql: &statement })?;
        self.database = Some(name.to_owned());
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<(), DatabaseError> {
        self.run(statement, Operation::Statement { sql: statement })
            .map(|_| ())
    }

    fn bulk_load(&mut self, path: &Path, request: &BulkLoad<'_>) -> Result<u64, DatabaseError> {
        // ROW_COUNT() only survives within the client's own session, so the
        // load and the count share one invocation.
        let statement = format!(
            "{}; SELECT ROW_COUNT()",
            sql::load_data(self.load_command, path, request)
        );
        let output = self.run(
            &statement,
            Operation::Load {
                table: request.table,
            },
        )?;
        let rows = parse_count(&output)?;
        debug!(target: DATABASE_TARGET, table = request.table, rows, "bridge bulk load finished");
        Ok(rows)
    }

    fn count_rows(&mut self, table: &str) -> Result<u64, DatabaseError> {
        let statement = sql::count_rows(table);
        let output = self.run(&statement, Operation::Statement { sql: &statement })?;
        parse_count(&output)
    }
}

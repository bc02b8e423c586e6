//! In-memory stand-ins for MySQL, the PID file, and the Sphinx tools.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use searchd_harness_config::Credentials;

use crate::database::{BulkLoad, Connector, DatabaseBackend, DatabaseError};
use crate::lifecycle::{CommandOutput, CommandRunner, DaemonState, Invocation, LifecycleError};

/// Simulated `searchd`/`indexer` pair sharing one PID file and process table.
#[derive(Debug)]
pub(crate) struct FakeSphinx {
    pid_file: Cell<Option<u32>>,
    live: RefCell<BTreeSet<u32>>,
    invocations: RefCell<Vec<Invocation>>,
    next_pid: Cell<u32>,
    writes_pid: Cell<bool>,
    banner: RefCell<String>,
}

impl Default for FakeSphinx {
    fn default() -> Self {
        Self {
            pid_file: Cell::new(None),
            live: RefCell::new(BTreeSet::new()),
            invocations: RefCell::new(Vec::new()),
            next_pid: Cell::new(4100),
            writes_pid: Cell::new(true),
            banner: RefCell::new(String::from("Sphinx 2.2.11-id64-release (95ae9a6)\n")),
        }
    }
}

impl FakeSphinx {
    /// Writes `pid` to the PID file and marks it alive.
    pub(crate) fn run_daemon_as(&self, pid: u32) {
        self.pid_file.set(Some(pid));
        self.live.borrow_mut().insert(pid);
    }

    /// Writes `pid` to the PID file without a matching process.
    pub(crate) fn leave_stale_pid(&self, pid: u32) {
        self.pid_file.set(Some(pid));
        self.live.borrow_mut().remove(&pid);
    }

    /// Makes launched daemons exit before writing their PID.
    pub(crate) fn fail_to_write_pid(&self) {
        self.writes_pid.set(false);
    }

    /// Sets the `searchd --help` banner.
    pub(crate) fn set_banner(&self, banner: &str) {
        *self.banner.borrow_mut() = banner.to_owned();
    }

    /// Every invocation, in order.
    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Invocations of the tool whose file name is `tool`.
    pub(crate) fn invocations_of(&self, tool: &str) -> Vec<Invocation> {
        self.invocations
            .borrow()
            .iter()
            .filter(|invocation| invocation.program().file_name() == Some(OsStr::new(tool)))
            .cloned()
            .collect()
    }

    /// `searchd` launches that started a daemon.
    pub(crate) fn daemon_launches(&self) -> usize {
        self.invocations_of("searchd")
            .iter()
            .filter(|invocation| !is_control(invocation))
            .count()
    }

    fn launch_daemon(&self) {
        if !self.writes_pid.get() {
            return;
        }
        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        self.run_daemon_as(pid);
    }

    fn stop_daemon(&self) {
        if let Some(pid) = self.pid_file.take() {
            self.live.borrow_mut().remove(&pid);
        }
    }
}

fn is_control(invocation: &Invocation) -> bool {
    ["--help", "--stop", "--stopwait"]
        .iter()
        .any(|flag| invocation.has_arg(flag))
}

impl DaemonState for FakeSphinx {
    fn recorded_pid(&self) -> Result<Option<u32>, LifecycleError> {
        Ok(self.pid_file.get())
    }

    fn process_exists(&self, pid: u32) -> bool {
        self.live.borrow().contains(&pid)
    }
}

impl CommandRunner for FakeSphinx {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.invocations.borrow_mut().push(invocation.clone());
        if invocation.program().file_name() != Some(OsStr::new("searchd")) {
            return Ok(CommandOutput::success("indexing index 'people'...\n"));
        }
        if invocation.has_arg("--help") {
            return Ok(CommandOutput::success(self.banner.borrow().as_str()));
        }
        if invocation.has_arg("--stop") || invocation.has_arg("--stopwait") {
            self.stop_daemon();
        } else {
            self.launch_daemon();
        }
        Ok(CommandOutput::success(""))
    }
}

/// One bulk load seen by [`FakeDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedLoad {
    pub(crate) table: String,
    pub(crate) staged_path: PathBuf,
    pub(crate) rows: u64,
}

#[derive(Debug, Default)]
struct DatabaseState {
    databases: BTreeSet<String>,
    selected: Option<String>,
    executed: Vec<String>,
    loads: Vec<RecordedLoad>,
    create_attempts: usize,
    concurrent_create: bool,
    reject_connect: bool,
    reject_table: Option<String>,
    connections: usize,
    open_sessions: usize,
}

/// MySQL stand-in shared between a connector and its sessions.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDatabase {
    state: Rc<RefCell<DatabaseState>>,
}

impl FakeDatabase {
    pub(crate) fn add_database(&self, name: &str) {
        self.state.borrow_mut().databases.insert(name.to_owned());
    }

    /// `CREATE DATABASE` reports 1007 although the listing did not show it.
    pub(crate) fn race_database_creation(&self) {
        self.state.borrow_mut().concurrent_create = true;
    }

    pub(crate) fn reject_connections(&self) {
        self.state.borrow_mut().reject_connect = true;
    }

    pub(crate) fn reject_loads_into(&self, table: &str) {
        self.state.borrow_mut().reject_table = Some(table.to_owned());
    }

    pub(crate) fn has_database(&self, name: &str) -> bool {
        self.state.borrow().databases.contains(name)
    }

    pub(crate) fn selected(&self) -> Option<String> {
        self.state.borrow().selected.clone()
    }

    pub(crate) fn create_attempts(&self) -> usize {
        self.state.borrow().create_attempts
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.state.borrow().executed.clone()
    }

    pub(crate) fn loads(&self) -> Vec<RecordedLoad> {
        self.state.borrow().loads.clone()
    }

    pub(crate) fn connections(&self) -> usize {
        self.state.borrow().connections
    }

    pub(crate) fn open_sessions(&self) -> usize {
        self.state.borrow().open_sessions
    }
}

impl Connector for FakeDatabase {
    type Backend = FakeSession;

    fn connect(&self, credentials: &Credentials) -> Result<FakeSession, DatabaseError> {
        let mut state = self.state.borrow_mut();
        state.connections += 1;
        if state.reject_connect {
            return Err(DatabaseError::Connection {
                host: credentials.host().to_owned(),
                message: String::from("Access denied for user 'root'@'localhost'"),
            });
        }
        state.open_sessions += 1;
        Ok(FakeSession {
            state: Rc::clone(&self.state),
        })
    }
}

/// A session on [`FakeDatabase`]; closing it is recorded on drop.
#[derive(Debug)]
pub(crate) struct FakeSession {
    state: Rc<RefCell<DatabaseState>>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.borrow_mut().open_sessions -= 1;
    }
}

impl DatabaseBackend for FakeSession {
    fn list_databases(&mut self) -> Result<BTreeSet<String>, DatabaseError> {
        Ok(self.state.borrow().databases.clone())
    }

    fn create_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.borrow_mut();
        state.create_attempts += 1;
        if state.concurrent_create || !state.databases.insert(name.to_owned()) {
            state.databases.insert(name.to_owned());
            return Err(DatabaseError::AlreadyExists {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn select_database(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.state.borrow_mut().selected = Some(name.to_owned());
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.state.borrow_mut().executed.push(sql.to_owned());
        Ok(())
    }

    fn bulk_load(&mut self, path: &Path, request: &BulkLoad<'_>) -> Result<u64, DatabaseError> {
        let contents = fs::read_to_string(path).map_err(|error| DatabaseError::Load {
            table: request.table.to_owned(),
            code: Some(29),
            message: error.to_string(),
        })?;
        let mut state = self.state.borrow_mut();
        if state.reject_table.as_deref() == Some(request.table) {
            return Err(DatabaseError::Load {
                table: request.table.to_owned(),
                code: Some(1262),
                message: String::from("Row 1 was truncated"),
            });
        }
        let rows = contents.lines().filter(|line| !line.is_empty()).count() as u64;
        state.loads.push(RecordedLoad {
            table: request.table.to_owned(),
            staged_path: path.to_path_buf(),
            rows,
        });
        Ok(rows)
    }

    fn count_rows(&mut self, table: &str) -> Result<u64, DatabaseError> {
        Ok(self
            .state
            .borrow()
            .loads
            .iter()
            .filter(|load| load.table == table)
            .map(|load| load.rows)
            .sum())
    }
}

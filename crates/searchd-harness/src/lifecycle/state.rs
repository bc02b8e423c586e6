//! Liveness oracle for `searchd`: its PID file and the OS process table.
//!
//! Nothing here caches. Every question is answered by reading the PID file
//! and probing the process table at the moment it is asked, so a daemon that
//! crashed or was restarted by someone else is seen as it really is.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;

#[cfg(unix)]
use libc::{EPERM, kill};

/// Read-only view of the daemon's external state.
pub trait DaemonState {
    /// Process id recorded in the PID file, if the file exists and holds a
    /// numeric token.
    fn recorded_pid(&self) -> Result<Option<u32>, LifecycleError>;

    /// Whether the process table has a live entry for `pid`.
    fn process_exists(&self, pid: u32) -> bool;
}

impl<T: DaemonState + ?Sized> DaemonState for &T {
    fn recorded_pid(&self) -> Result<Option<u32>, LifecycleError> {
        (**self).recorded_pid()
    }

    fn process_exists(&self, pid: u32) -> bool {
        (**self).process_exists(pid)
    }
}

/// Reads the PID file from disk and probes the host process table.
#[derive(Debug, Clone)]
pub struct SystemDaemonState {
    pid_path: Utf8PathBuf,
}

impl SystemDaemonState {
    /// Watches the PID file at `pid_path`.
    #[must_use]
    pub fn new(pid_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            pid_path: pid_path.into(),
        }
    }

    /// PID file being watched.
    #[must_use]
    pub fn pid_path(&self) -> &Utf8Path {
        self.pid_path.as_path()
    }
}

impl DaemonState for SystemDaemonState {
    fn recorded_pid(&self) -> Result<Option<u32>, LifecycleError> {
        match fs::read(&self.pid_path) {
            Ok(content) => {
                let pid = first_numeric_token(&content);
                debug!(target: LIFECYCLE_TARGET, path = %self.pid_path, ?pid, "read pid file");
                Ok(pid)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LifecycleError::ReadPid {
                path: self.pid_path.clone(),
                source,
            }),
        }
    }

    fn process_exists(&self, pid: u32) -> bool {
        process_table_has(pid)
    }
}

/// Parses the first run of ASCII digits as a process id.
///
/// The file is scanned as raw bytes, so stray non-UTF-8 content around the
/// number is ignored. Zero and values that do not fit a `pid_t` are treated
/// as absent: zero addresses the caller's process group and would otherwise
/// look alive.
pub(crate) fn first_numeric_token(content: &[u8]) -> Option<u32> {
    let digits = content
        .iter()
        .skip_while(|byte| !byte.is_ascii_digit())
        .take_while(|byte| byte.is_ascii_digit());
    let mut pid: u32 = 0;
    let mut seen = false;
    for digit in digits {
        seen = true;
        pid = pid
            .checked_mul(10)?
            .checked_add(u32::from(digit - b'0'))?;
    }
    Some(pid).filter(|pid| seen && *pid != 0 && i32::try_from(*pid).is_ok())
}

#[cfg(unix)]
fn process_table_has(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs the existence and permission checks of
    // `kill(2)` without delivering anything.
    let result = unsafe { kill(raw, 0) };
    if result == 0 {
        return true;
    }
    // EPERM means the process exists but belongs to another user.
    io::Error::last_os_error().raw_os_error() == Some(EPERM)
}

#[cfg(not(unix))]
fn process_table_has(_pid: u32) -> bool {
    false
}

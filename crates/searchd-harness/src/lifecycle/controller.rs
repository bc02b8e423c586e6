use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use super::runner::{CommandOutput, CommandRunner, Invocation, SphinxBinaries};
use super::state::DaemonState;
use super::version::{SphinxVersion, StopFlag};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Static inputs for a [`DaemonController`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    binaries: SphinxBinaries,
    config_path: Utf8PathBuf,
    log_path: Utf8PathBuf,
    version: Option<SphinxVersion>,
    startup_timeout: Duration,
}

impl ControllerSettings {
    /// Settings for a daemon driven by the configuration at `config_path`.
    ///
    /// The version is detected from `searchd --help` on first stop unless
    /// set with [`Self::with_version`].
    #[must_use]
    pub fn new(
        binaries: SphinxBinaries,
        config_path: impl Into<Utf8PathBuf>,
        log_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            binaries,
            config_path: config_path.into(),
            log_path: log_path.into(),
            version: None,
            startup_timeout: Duration::from_secs(1),
        }
    }

    /// Uses a known daemon version instead of detecting it.
    #[must_use]
    pub const fn with_version(mut self, version: Option<SphinxVersion>) -> Self {
        self.version = version;
        self
    }

    /// Bounds the readiness poll after launching the daemon.
    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Daemon configuration file.
    #[must_use]
    pub fn config_path(&self) -> &Utf8Path {
        self.config_path.as_path()
    }

    /// Daemon log named in start diagnostics.
    #[must_use]
    pub fn log_path(&self) -> &Utf8Path {
        self.log_path.as_path()
    }
}

/// Result of [`DaemonController::build_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The daemon was stopped; indexes were written in place.
    Built,
    /// The daemon was running and was asked to rotate to the new indexes.
    Rotated,
}

/// Result of [`DaemonController::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A live daemon was found; nothing was launched.
    AlreadyRunning {
        /// Process id of the existing daemon.
        pid: u32,
    },
    /// The daemon was launched and wrote its PID file.
    Started {
        /// Process id of the new daemon.
        pid: u32,
    },
    /// The daemon was launched but never appeared in the process table
    /// before the startup timeout.
    NotReady {
        /// Log to inspect for the cause.
        log_path: Utf8PathBuf,
    },
}

/// Result of [`DaemonController::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No live daemon was found; nothing was run.
    NotRunning,
    /// The stop command was issued and succeeded.
    Stopped {
        /// Process id that was stopped.
        pid: u32,
        /// Flag used.
        flag: StopFlag,
    },
}

/// Drives `indexer` and `searchd` against one configuration file.
///
/// The controller holds no belief about whether the daemon runs. Every
/// operation re-derives it from [`DaemonState`] immediately before acting.
#[derive(Debug)]
pub struct DaemonController<S, R> {
    state: S,
    runner: R,
    settings: ControllerSettings,
}

impl<S: DaemonState, R: CommandRunner> DaemonController<S, R> {
    /// Builds a controller from its external-state oracle and command runner.
    pub const fn new(state: S, runner: R, settings: ControllerSettings) -> Self {
        Self {
            state,
            runner,
            settings,
        }
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Process id of the live daemon, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ReadPid`] when the PID file exists but
    /// cannot be read.
    pub fn running_pid(&self) -> Result<Option<u32>, LifecycleError> {
        let Some(pid) = self.state.recorded_pid()? else {
            debug!(target: LIFECYCLE_TARGET, "no pid recorded");
            return Ok(None);
        };
        let alive = self.state.process_exists(pid);
        debug!(target: LIFECYCLE_TARGET, pid, alive, "checked recorded pid");
        Ok(alive.then_some(pid))
    }

    /// Whether a live daemon owns the PID file.
    ///
    /// # Errors
    ///
    /// See [`Self::running_pid`].
    pub fn is_running(&self) -> Result<bool, LifecycleError> {
        self.running_pid().map(|pid| pid.is_some())
    }

    /// Runs `indexer --all`, adding `--rotate` when the daemon is running at
    /// the moment of the call.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ProcessLaunch`] when `indexer` cannot be
    /// launched and [`LifecycleError::IndexBuild`] when it exits non-zero.
    pub fn build_index(&self) -> Result<IndexOutcome, LifecycleError> {
        let rotate = self.is_running()?;
        let mut invocation = Invocation::new(self.settings.binaries.indexer())
            .arg("--config")
            .arg(self.settings.config_path.as_str())
            .arg("--all");
        if rotate {
            invocation = invocation.arg("--rotate");
        }
        info!(target: LIFECYCLE_TARGET, rotate, "building indexes");
        let output = self.launch(&invocation)?;
        if !output.success {
            return Err(LifecycleError::IndexBuild {
                rotate,
                code: output.code,
                stderr: output.combined().trim().to_owned(),
            });
        }
        Ok(if rotate {
            IndexOutcome::Rotated
        } else {
            IndexOutcome::Built
        })
    }

    /// Launches `searchd` unless it is already running, then polls for its
    /// PID until the startup timeout elapses.
    ///
    /// A daemon that never becomes visible is reported as
    /// [`StartOutcome::NotReady`] with a warning, not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ProcessLaunch`] when `searchd` cannot be
    /// launched and [`LifecycleError::LaunchFailed`] when it exits non-zero.
    pub fn start(&self) -> Result<StartOutcome, LifecycleError> {
        if let Some(pid) = self.running_pid()? {
            info!(target: LIFECYCLE_TARGET, pid, "searchd already running");
            return Ok(StartOutcome::AlreadyRunning { pid });
        }
        let invocation = Invocation::new(self.settings.binaries.searchd())
            .arg("--config")
            .arg(self.settings.config_path.as_str())
            .detached();
        info!(target: LIFECYCLE_TARGET, config = %self.settings.config_path, "launching searchd");
        let output = self.launch(&invocation)?;
        if !output.success {
            return Err(LifecycleError::LaunchFailed {
                code: output.code,
                log_path: self.settings.log_path.clone(),
            });
        }
        match self.await_ready()? {
            Some(pid) => {
                info!(target: LIFECYCLE_TARGET, pid, "searchd started");
                Ok(StartOutcome::Started { pid })
            }
            None => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    log = %self.settings.log_path,
                    "Failed to start searchd daemon. Check {}.",
                    self.settings.log_path
                );
                Ok(StartOutcome::NotReady {
                    log_path: self.settings.log_path.clone(),
                })
            }
        }
    }

    /// Stops a running daemon with the flag its version supports.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::VersionDetect`] or
    /// [`LifecycleError::ProcessLaunch`] when `searchd` cannot be launched and
    /// [`LifecycleError::StopFailed`] when the stop command exits non-zero.
    pub fn stop(&self) -> Result<StopOutcome, LifecycleError> {
        let Some(pid) = self.running_pid()? else {
            info!(target: LIFECYCLE_TARGET, "searchd not running");
            return Ok(StopOutcome::NotRunning);
        };
        let version = match self.settings.version {
            Some(version) => Some(version),
            None => SphinxVersion::detect(&self.runner, &self.settings.binaries)?,
        };
        let flag = StopFlag::for_version(version);
        info!(target: LIFECYCLE_TARGET, pid, flag = flag.as_flag(), "stopping searchd");
        let invocation = Invocation::new(self.settings.binaries.searchd())
            .arg("--config")
            .arg(self.settings.config_path.as_str())
            .arg(flag.as_flag());
        let output = self.launch(&invocation)?;
        if !output.success {
            return Err(LifecycleError::StopFailed {
                flag: flag.as_flag(),
                code: output.code,
                stderr: output.combined().trim().to_owned(),
            });
        }
        Ok(StopOutcome::Stopped { pid, flag })
    }

    fn launch(&self, invocation: &Invocation) -> Result<CommandOutput, LifecycleError> {
        self.runner
            .run(invocation)
            .map_err(|source| LifecycleError::ProcessLaunch {
                program: invocation.program().to_path_buf(),
                source,
            })
    }

    fn await_ready(&self) -> Result<Option<u32>, LifecycleError> {
        let deadline = Instant::now() + self.settings.startup_timeout;
        loop {
            if let Some(pid) = self.running_pid()? {
                return Ok(Some(pid));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

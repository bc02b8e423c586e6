//! Maps CLI commands onto the fixture loader, generator, and controller.

use std::io::Write;
use std::process::ExitCode;

use searchd_harness_config::{Config, Credentials, FixturePaths};

use crate::AppError;
use crate::cli::HarnessCommand;
use crate::database::{ClientSettings, Connector};
use crate::fixtures::{FixtureLoader, FixtureSpec};
use crate::generator::ConfigGenerator;
use crate::lifecycle::{
    CommandRunner, ControllerSettings, DaemonController, DaemonState, IndexOutcome, SphinxBinaries,
    SphinxVersion, StartOutcome, StopOutcome, SystemDaemonState, SystemRunner,
};
use crate::output::HarnessOutput;

/// Components a command needs, resolved once from configuration.
pub(crate) struct Harness<C, S, R> {
    config: Config,
    paths: FixturePaths,
    connector: C,
    state: S,
    runner: R,
}

pub(crate) type SystemHarness = Harness<ClientSettings, SystemDaemonState, SystemRunner>;

impl SystemHarness {
    /// Wires the production database client, PID file, and process runner.
    pub(crate) fn from_config(config: Config) -> Self {
        let paths = config.fixture_paths();
        let connector = ClientSettings::from_config(&config);
        let state = SystemDaemonState::new(paths.pid_path());
        Harness::new(config, connector, state, SystemRunner)
    }
}

impl<C: Connector, S: DaemonState, R: CommandRunner> Harness<C, S, R> {
    pub(crate) fn new(config: Config, connector: C, state: S, runner: R) -> Self {
        Self {
            paths: config.fixture_paths(),
            config,
            connector,
            state,
            runner,
        }
    }

    pub(crate) fn handle<W: Write, E: Write>(
        &self,
        command: HarnessCommand,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        match command {
            HarnessCommand::Setup => self.setup(output),
            HarnessCommand::Configure => self.configure(output),
            HarnessCommand::Index => self.index(output),
            HarnessCommand::Start => self.start(output),
            HarnessCommand::Stop => self.stop(output),
            HarnessCommand::Status => self.status(output),
            HarnessCommand::Prepare => {
                self.setup(output)?;
                self.configure(output)?;
                self.index(output)?;
                self.start(output)
            }
        }
    }

    fn setup<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        let credentials = self.credentials()?;
        let spec = FixtureSpec::load(&self.paths)?;
        let report =
            FixtureLoader::new(&self.connector, self.config.database()).setup(&credentials, &spec)?;
        if report.created_database {
            output.stdout_line(format_args!("created database {}", self.config.database()))?;
        }
        output.stdout_line(format_args!(
            "executed {} schema statements",
            report.statements
        ))?;
        for table in &report.loaded {
            output.stdout_line(format_args!("loaded {} rows into {}", table.rows, table.table))?;
        }
        Ok(ExitCode::SUCCESS)
    }

    fn configure<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        let credentials = self.credentials()?;
        let path = ConfigGenerator::new(self.paths.clone(), self.config.database())
            .generate(&credentials)?;
        output.stdout_line(format_args!("wrote {path}"))?;
        Ok(ExitCode::SUCCESS)
    }

    fn index<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        match self.controller()?.build_index()? {
            IndexOutcome::Built => output.stdout_line(format_args!("indexes built"))?,
            IndexOutcome::Rotated => {
                output.stdout_line(format_args!("indexes built and rotated into searchd"))?;
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn start<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        match self.controller()?.start()? {
            StartOutcome::AlreadyRunning { pid } => {
                output.stdout_line(format_args!("searchd already running (pid {pid})"))?;
            }
            StartOutcome::Started { pid } => {
                output.stdout_line(format_args!("searchd started (pid {pid})"))?;
            }
            StartOutcome::NotReady { log_path } => {
                output.stderr_line(format_args!(
                    "Failed to start searchd daemon. Check {log_path}."
                ))?;
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn stop<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        match self.controller()?.stop()? {
            StopOutcome::NotRunning => output.stdout_line(format_args!("searchd is not running"))?,
            StopOutcome::Stopped { pid, flag } => output.stdout_line(format_args!(
                "searchd (pid {pid}) stopped with {}",
                flag.as_flag()
            ))?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn status<W: Write, E: Write>(
        &self,
        output: &mut HarnessOutput<W, E>,
    ) -> Result<ExitCode, AppError> {
        match self.controller()?.running_pid()? {
            Some(pid) => output.stdout_line(format_args!("searchd running (pid {pid})"))?,
            None => output.stdout_line(format_args!("searchd not running"))?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn credentials(&self) -> Result<Credentials, AppError> {
        Ok(Credentials::load(&self.paths.credentials_path())?)
    }

    fn controller(&self) -> Result<DaemonController<&S, &R>, AppError> {
        let version = self
            .config
            .sphinx_version()
            .map(str::parse::<SphinxVersion>)
            .transpose()?;
        let settings = ControllerSettings::new(
            SphinxBinaries::new(self.config.sphinx_bin()),
            self.paths.config_path(),
            self.paths.log_path(),
        )
        .with_version(version)
        .with_startup_timeout(self.config.startup_timeout());
        Ok(DaemonController::new(&self.state, &self.runner, settings))
    }
}

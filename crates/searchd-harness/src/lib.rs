//! Fixture harness for integration suites running against Sphinx `searchd`.
//!
//! A test run prepares two external systems. [`fixtures::FixtureLoader`]
//! creates the MySQL fixture database and bulk-loads it through one of the
//! [`database`] clients. [`lifecycle::DaemonController`] then builds the
//! indexes and starts the daemon from the configuration rendered by
//! [`generator::ConfigGenerator`], and stops it again at teardown.
//!
//! The binary exposes each step as a command; [`run`] is its entry point and
//! can be driven from tests with in-memory output streams.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use searchd_harness_config::Config;

mod cli;
mod config;
pub mod database;
mod errors;
pub mod fixtures;
pub mod generator;
mod harness;
pub mod lifecycle;
mod output;
pub mod telemetry;

use cli::{Cli, HarnessCommand};
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use harness::SystemHarness;
use output::HarnessOutput;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of
/// [`searchd_harness_config::Config`].
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--fixtures-dir",
    "--database",
    "--sphinx-bin",
    "--sphinx-version",
    "--load-command",
    "--db-client",
    "--mysql-client",
    "--startup-timeout-ms",
    "--log-filter",
    "--log-format",
];

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        self.run_with_handler(args, |command, config, output| {
            telemetry::initialise(config)?;
            SystemHarness::from_config(config.clone()).handle(command, output)
        })
    }

    fn run_with_handler<I, F>(&mut self, args: I, mut handler: F) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        F: FnMut(
            HarnessCommand,
            &Config,
            &mut HarnessOutput<&mut W, &mut E>,
        ) -> Result<ExitCode, AppError>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let cli_arguments = prepare_cli_arguments(&args, &split);

        let result = Cli::try_parse_from(cli_arguments)
            .map_err(AppError::CliUsage)
            .and_then(|cli| {
                self.loader
                    .load(&split.config_arguments)
                    .map(|config| (cli, config))
            })
            .and_then(|(cli, config)| {
                let mut output = HarnessOutput::new(&mut *self.io.stdout, &mut *self.io.stderr);
                handler(cli.command, &config, &mut output)
            });

        match result {
            Ok(exit_code) => exit_code,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }
}

/// Runs the harness CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}

/// Program name followed by everything from the subcommand onwards.
fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let command = args.get(split.command_start..).unwrap_or_default();
    args.first().into_iter().chain(command).cloned().collect()
}

#[cfg(test)]
mod tests;

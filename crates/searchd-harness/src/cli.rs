//! CLI argument definitions for the fixture harness.

use clap::{Parser, Subcommand};

/// Prepares the MySQL fixtures and Sphinx daemon for an integration suite.
///
/// Configuration flags such as `--fixtures-dir` or `--database` must precede
/// the command.
#[derive(Parser, Debug)]
#[command(name = "searchd-harness", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Harness step to run.
    #[command(subcommand)]
    pub(crate) command: HarnessCommand,
}

/// Harness steps, in the order a test run normally uses them.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HarnessCommand {
    /// Creates the fixture database and loads schema and data.
    Setup,
    /// Renders the daemon configuration from the fixture template.
    Configure,
    /// Builds the indexes, rotating them when the daemon is running.
    Index,
    /// Starts the daemon unless it is already running.
    Start,
    /// Stops the daemon if it is running.
    #[command(visible_alias = "teardown")]
    Stop,
    /// Reports whether the daemon is running.
    Status,
    /// Runs setup, configure, index, and start in sequence.
    Prepare,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("setup", HarnessCommand::Setup)]
    #[case("configure", HarnessCommand::Configure)]
    #[case("index", HarnessCommand::Index)]
    #[case("start", HarnessCommand::Start)]
    #[case("stop", HarnessCommand::Stop)]
    #[case("teardown", HarnessCommand::Stop)]
    #[case("status", HarnessCommand::Status)]
    #[case("prepare", HarnessCommand::Prepare)]
    fn parses_commands(#[case] token: &str, #[case] expected: HarnessCommand) {
        let cli = Cli::try_parse_from(["searchd-harness", token]).expect("parse");
        assert_eq!(cli.command, expected);
    }

    #[test]
    fn rejects_missing_command() {
        assert!(Cli::try_parse_from(["searchd-harness"]).is_err());
    }
}

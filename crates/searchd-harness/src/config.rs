//! Configuration loading helpers for the harness CLI.
//!
//! Leading configuration flags are handed to `ortho_config`; everything from
//! the first other token onwards is parsed as the harness command.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use searchd_harness_config::Config;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    ///
    /// # Flag Ordering
    ///
    /// Flags listed in `CONFIG_CLI_FLAGS` must appear before the command.
    /// Flags after the command are parsed by the command parser and rejected.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

/// How a leading argument takes part in configuration loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    /// A configuration flag; `needs_value` when its value is the next token.
    Include { needs_value: bool },
    /// Anything else, which begins the command.
    Skip,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let Some(body) = text.strip_prefix("--") else {
        return FlagAction::Skip;
    };
    let (name, inline_value) = match body.split_once('=') {
        Some((name, _)) => (name, true),
        None => (body, false),
    };
    let known = super::CONFIG_CLI_FLAGS
        .iter()
        .any(|flag| flag.strip_prefix("--") == Some(name));
    if known {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

/// Collects the program name and leading configuration flags; the command
/// starts at the first argument that is neither.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut config_arguments = Vec::with_capacity(args.len());
    let mut remaining = args.iter();
    if let Some(program) = remaining.next() {
        config_arguments.push(program.clone());
    }

    while let Some(argument) = remaining.as_slice().first() {
        match classify_flag(argument) {
            FlagAction::Skip => break,
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                remaining.next();
                if needs_value {
                    config_arguments.extend(remaining.next().cloned());
                }
            }
        }
    }

    ConfigArgumentSplit {
        command_start: args.len() - remaining.as_slice().len(),
        config_arguments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn inline_value_flags_do_not_need_follow_up_value() {
        let result = classify_flag(OsStr::new("--database=riddle"));
        assert!(matches!(result, FlagAction::Include { needs_value: false }));
    }

    #[test]
    fn separate_value_flags_consume_following_argument() {
        let result = classify_flag(OsStr::new("--fixtures-dir"));
        assert!(matches!(result, FlagAction::Include { needs_value: true }));
    }

    #[test]
    fn unknown_flags_are_skipped() {
        let result = classify_flag(OsStr::new("--unknown"));
        assert!(matches!(result, FlagAction::Skip));
    }

    #[test]
    fn split_stops_at_the_command() {
        let args = os_args(&[
            "searchd-harness",
            "--fixtures-dir",
            "spec/fixtures",
            "--log-format=compact",
            "start",
            "--database",
            "ignored",
        ]);
        let split = split_config_arguments(&args);
        assert_eq!(
            split.config_arguments,
            os_args(&[
                "searchd-harness",
                "--fixtures-dir",
                "spec/fixtures",
                "--log-format=compact"
            ])
        );
        assert_eq!(split.command_start, 4);
    }

    #[test]
    fn program_name_alone_loads_the_defaults() {
        let config = OrthoConfigLoader
            .load(&os_args(&["searchd-harness"]))
            .expect("defaults load without any layer");
        assert_eq!(config.database(), "riddle");
        assert_eq!(config.mysql_client(), "mysql");
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert_eq!(split.command_start, 0);
    }
}

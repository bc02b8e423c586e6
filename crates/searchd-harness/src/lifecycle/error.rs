//! Error types for daemon lifecycle operations.

use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while indexing, starting, or stopping `searchd`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to read pid file {path}: {source}")]
    ReadPid {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch '{}': {source}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("searchd exited with {} while starting; check {log_path}", exit_label(.code))]
    LaunchFailed {
        code: Option<i32>,
        log_path: Utf8PathBuf,
    },
    #[error("indexer exited with {} (rotate: {rotate}): {stderr}", exit_label(.code))]
    IndexBuild {
        rotate: bool,
        code: Option<i32>,
        stderr: String,
    },
    #[error("searchd {flag} exited with {}: {stderr}", exit_label(.code))]
    StopFailed {
        flag: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to detect the searchd version via '{}': {source}", .program.display())]
    VersionDetect {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| String::from("a signal"), |value| format!("status {value}"))
}

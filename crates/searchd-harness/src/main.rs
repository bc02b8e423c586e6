//! CLI entrypoint for the searchd fixture harness.
//!
//! The binary delegates to [`searchd_harness::run`], which loads layered
//! configuration and runs one harness command.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    searchd_harness::run(std::env::args_os(), &mut stdout, &mut stderr)
}

//! Test suites for the fixture harness.

mod cli_runner;
mod support;

//! Executes the Sphinx command-line tools.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use camino::Utf8PathBuf;

/// A single invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    capture: bool,
}

impl Invocation {
    /// Builds an invocation whose output is captured.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture: true,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Discards stdout and stderr instead of capturing them.
    ///
    /// Used when launching `searchd`: the forked daemon may keep inherited
    /// pipes open, which would block a capturing caller forever.
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.capture = false;
        self
    }

    /// Executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        self.program.as_path()
    }

    /// Arguments, excluding the program.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether output is captured.
    #[must_use]
    pub const fn captures_output(&self) -> bool {
        self.capture
    }

    /// Whether `flag` appears among the arguments.
    #[must_use]
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

/// Result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs external tools to completion.
pub trait CommandRunner {
    /// Runs `invocation`, blocking until it exits.
    ///
    /// An `Err` means the program could not be launched at all; a launched
    /// program that fails is reported through [`CommandOutput::success`].
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Runs tools with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let mut command = Command::new(invocation.program());
        command.args(invocation.args()).stdin(Stdio::null());
        if invocation.captures_output() {
            let output = command.output()?;
            return Ok(CommandOutput {
                code: output.status.code(),
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let status = command.stdout(Stdio::null()).stderr(Stdio::null()).status()?;
        Ok(CommandOutput {
            code: status.code(),
            success: status.success(),
            ..CommandOutput::default()
        })
    }
}

/// Locations of the `indexer` and `searchd` executables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SphinxBinaries {
    directory: Option<Utf8PathBuf>,
}

impl SphinxBinaries {
    /// Resolves binaries inside `directory`, or on `PATH` when `None`.
    #[must_use]
    pub const fn new(directory: Option<Utf8PathBuf>) -> Self {
        Self { directory }
    }

    /// The indexing tool.
    #[must_use]
    pub fn indexer(&self) -> PathBuf {
        self.resolve("indexer")
    }

    /// The search daemon.
    #[must_use]
    pub fn searchd(&self) -> PathBuf {
        self.resolve("searchd")
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.directory
            .as_ref()
            .map_or_else(|| PathBuf::from(name), |dir| dir.join(name).into_std_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binaries_resolve_on_path_without_directory() {
        let binaries = SphinxBinaries::default();
        assert_eq!(binaries.indexer(), PathBuf::from("indexer"));
        assert_eq!(binaries.searchd(), PathBuf::from("searchd"));
    }

    #[test]
    fn binaries_resolve_inside_configured_directory() {
        let binaries = SphinxBinaries::new(Some(Utf8PathBuf::from("/opt/sphinx/bin/")));
        assert_eq!(binaries.indexer(), PathBuf::from("/opt/sphinx/bin/indexer"));
        assert_eq!(binaries.searchd(), PathBuf::from("/opt/sphinx/bin/searchd"));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let invocation = Invocation::new("/nonexistent/searchd-harness/searchd").arg("--help");
        let error = SystemRunner.run(&invocation).expect_err("launch should fail");
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn captured_output_reports_exit_status() {
        let output = SystemRunner
            .run(&Invocation::new("sh").arg("-c").arg("echo out; echo err >&2; exit 3"))
            .expect("run sh");
        assert_eq!(output.code, Some(3));
        assert!(!output.success);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn detached_output_is_discarded() {
        let output = SystemRunner
            .run(&Invocation::new("sh").arg("-c").arg("echo ignored").detached())
            .expect("run sh");
        assert!(output.success);
        assert!(output.stdout.is_empty());
    }
}

//! Line-oriented command output on the injected stdout and stderr.

use std::fmt;
use std::io::Write;

use crate::AppError;

/// Line-oriented writer over the command's stdout and stderr.
pub(crate) struct HarnessOutput<W: Write, E: Write> {
    stdout: W,
    stderr: E,
}

impl<W: Write, E: Write> HarnessOutput<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        write_line(&mut self.stdout, args)
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        write_line(&mut self.stderr, args)
    }
}

fn write_line<T: Write>(sink: &mut T, args: fmt::Arguments<'_>) -> Result<(), AppError> {
    sink.write_fmt(args).map_err(AppError::Output)?;
    sink.write_all(b"\n").map_err(AppError::Output)?;
    sink.flush().map_err(AppError::Output)
}

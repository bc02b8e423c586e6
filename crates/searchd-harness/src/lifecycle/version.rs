//! Version-dependent stop flag for `searchd`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use super::runner::{CommandRunner, Invocation, SphinxBinaries};

const BANNER_PRODUCTS: [&str; 2] = ["Sphinx", "Manticore"];

/// A daemon release number such as `2.2.11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SphinxVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

/// Raised when a configured version string is not `X.Y[.Z]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid searchd version '{0}', expected MAJOR.MINOR[.PATCH]")]
pub struct VersionParseError(String);

impl SphinxVersion {
    /// Builds a version from its parts.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Major release.
    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    /// Finds the first `Sphinx X.Y[.Z]` or `Manticore X.Y[.Z]` token in a
    /// `searchd --help` banner.
    #[must_use]
    pub fn from_banner(banner: &str) -> Option<Self> {
        let mut words = banner.split_whitespace().peekable();
        while let Some(word) = words.next() {
            if !BANNER_PRODUCTS.contains(&word) {
                continue;
            }
            if let Some(version) = words.peek().and_then(|next| leading_version(next)) {
                return Some(version);
            }
        }
        None
    }

    /// Runs `searchd --help` and reads the version from its banner.
    ///
    /// Older releases exit non-zero after printing help, so the exit status is
    /// ignored and both streams are searched.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::VersionDetect`] when `searchd` cannot be
    /// launched.
    pub fn detect<R: CommandRunner>(
        runner: &R,
        binaries: &SphinxBinaries,
    ) -> Result<Option<Self>, LifecycleError> {
        let program = binaries.searchd();
        let output = runner
            .run(&Invocation::new(&program).arg("--help"))
            .map_err(|source| LifecycleError::VersionDetect {
                program: program.clone(),
                source,
            })?;
        let version = Self::from_banner(&output.combined());
        debug!(target: LIFECYCLE_TARGET, ?version, "detected searchd version");
        Ok(version)
    }
}

impl FromStr for SphinxVersion {
    type Err = VersionParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let mut parts = trimmed.split('.');
        let mut next = |required: bool| -> Result<u32, VersionParseError> {
            match parts.next() {
                Some(part) => part
                    .parse()
                    .map_err(|_| VersionParseError(text.to_owned())),
                None if required => Err(VersionParseError(text.to_owned())),
                None => Ok(0),
            }
        };
        let version = Self::new(next(true)?, next(true)?, next(false)?);
        if parts.next().is_some() {
            return Err(VersionParseError(text.to_owned()));
        }
        Ok(version)
    }
}

impl fmt::Display for SphinxVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Reads `X.Y[.Z]` from the start of a banner word such as `2.2.11-id64-release`.
fn leading_version(word: &str) -> Option<SphinxVersion> {
    let numeric = word
        .split(|character: char| !(character.is_ascii_digit() || character == '.'))
        .next()?;
    numeric.trim_end_matches('.').parse().ok()
}

/// Flag passed to `searchd` to shut it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopFlag {
    /// Waits for in-flight clients before exiting.
    StopWait,
    /// Signals the daemon and returns immediately.
    Stop,
}

impl StopFlag {
    /// `--stopwait` from major release 1 onwards, `--stop` for 0.9.x and for
    /// an unknown version.
    #[must_use]
    pub fn for_version(version: Option<SphinxVersion>) -> Self {
        match version {
            Some(known) if known.major() >= 1 => Self::StopWait,
            _ => Self::Stop,
        }
    }

    /// Command-line spelling.
    #[must_use]
    pub const fn as_flag(self) -> &'static str {
        match self {
            Self::StopWait => "--stopwait",
            Self::Stop => "--stop",
        }
    }
}

//! Copies fixture data to world-readable temporary files for bulk loads.
//!
//! The database server may run as another user, so it reads a staged copy
//! rather than the original. Each copy is removed when its handle drops.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use camino::Utf8Path;
use tempfile::{Builder, NamedTempFile};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const STAGED_PREFIX: &str = "searchd-harness-";

/// Where fixture files are copied before the server reads them.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    directory: Option<PathBuf>,
}

impl StagingArea {
    /// Stages into the system temporary directory.
    #[must_use]
    pub const fn system() -> Self {
        Self { directory: None }
    }

    /// Stages into `directory`, which must already exist.
    #[must_use]
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    /// Copies `source` into a world-readable temporary file.
    ///
    /// The MySQL server may run as a different user than the harness, so the
    /// copy is readable by everyone. The file is removed when the returned
    /// [`StagedFile`] drops.
    pub fn stage(&self, source: &Utf8Path) -> io::Result<StagedFile> {
        let mut input = File::open(source)?;
        let suffix = source
            .extension()
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default();
        let mut builder = Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(&suffix);
        let mut file = match &self.directory {
            Some(directory) => builder.tempfile_in(directory)?,
            None => builder.tempfile()?,
        };
        io::copy(&mut input, file.as_file_mut())?;
        file.as_file().sync_all()?;
        #[cfg(unix)]
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644))?;
        Ok(StagedFile { file })
    }
}

/// A staged copy of a fixture file, deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Location handed to the bulk-load statement.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

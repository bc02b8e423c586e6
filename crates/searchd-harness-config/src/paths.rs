//! Derives fixture artefact paths shared by the loader and daemon controller.
//!
//! The fixture tree holds the SQL fixtures, the rendered Sphinx
//! configuration, and the files `searchd` writes while it runs. Every
//! component resolves its paths through [`FixturePaths`] so they agree on the
//! layout.

use camino::{Utf8Path, Utf8PathBuf};

/// Canonical paths inside a fixture tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    root: Utf8PathBuf,
    sql_dir: Utf8PathBuf,
    sphinx_dir: Utf8PathBuf,
}

impl FixturePaths {
    /// Builds the layout rooted at `root`. Nothing is created on disk.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        Self {
            sql_dir: root.join("sql"),
            sphinx_dir: root.join("sphinx"),
            root,
        }
    }

    /// Root of the fixture tree.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.root.as_path()
    }

    /// Directory holding SQL fixtures.
    #[must_use]
    pub fn sql_dir(&self) -> &Utf8Path {
        self.sql_dir.as_path()
    }

    /// Directory holding Sphinx configuration and runtime files.
    #[must_use]
    pub fn sphinx_dir(&self) -> &Utf8Path {
        self.sphinx_dir.as_path()
    }

    /// Optional YAML credentials file.
    #[must_use]
    pub fn credentials_path(&self) -> Utf8PathBuf {
        self.sql_dir.join("conf.yml")
    }

    /// Schema DDL executed before loading data.
    #[must_use]
    pub fn schema_path(&self) -> Utf8PathBuf {
        self.sql_dir.join("structure.sql")
    }

    /// Default bulk data file for the `people` table.
    #[must_use]
    pub fn people_data_path(&self) -> Utf8PathBuf {
        self.sql_dir.join("data.tsv")
    }

    /// Optional manifest describing the bulk-load files.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.sql_dir.join("fixtures.yml")
    }

    /// Template rendered into [`Self::config_path`].
    #[must_use]
    pub fn template_path(&self) -> Utf8PathBuf {
        self.sphinx_dir.join("configuration.template")
    }

    /// Rendered daemon configuration consumed by `indexer` and `searchd`.
    #[must_use]
    pub fn config_path(&self) -> Utf8PathBuf {
        self.sphinx_dir.join("spec.conf")
    }

    /// PID file written by `searchd`.
    #[must_use]
    pub fn pid_path(&self) -> Utf8PathBuf {
        self.sphinx_dir.join("searchd.pid")
    }

    /// Log file written by `searchd`; referenced in start-up diagnostics.
    #[must_use]
    pub fn log_path(&self) -> Utf8PathBuf {
        self.sphinx_dir.join("searchd.log")
    }

    /// Binary log directory the daemon expects to exist.
    #[must_use]
    pub fn binlog_dir(&self) -> Utf8PathBuf {
        self.sphinx_dir.join("binlog")
    }
}

//! Fixture descriptions: the schema file and the ordered bulk-load files.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use searchd_harness_config::FixturePaths;
use serde::Deserialize;
use thiserror::Error;

use crate::database::BulkLoad;

const PEOPLE_TABLE: &str = "people";
const PEOPLE_COLUMNS: &[&str] = &[
    "gender",
    "first_name",
    "middle_initial",
    "last_name",
    "street_address",
    "city",
    "state",
    "postcode",
    "email",
    "birthday",
];
const DEFAULT_DELIMITER: char = ',';
const DEFAULT_QUOTE: char = '\'';

/// One file to bulk-load into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDataFile {
    table: String,
    path: Utf8PathBuf,
    columns: Vec<String>,
    delimiter: char,
    quote: char,
}

impl BulkDataFile {
    /// Describes a bulk-load file.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        path: impl Into<Utf8PathBuf>,
        columns: Vec<String>,
        delimiter: char,
        quote: char,
    ) -> Self {
        Self {
            table: table.into(),
            path: path.into(),
            columns,
            delimiter,
            quote,
        }
    }

    /// Target table.
    #[must_use]
    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Source file; staged before loading.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Columns receiving the file's fields.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Load request for this file.
    #[must_use]
    pub fn request(&self) -> BulkLoad<'_> {
        BulkLoad {
            table: &self.table,
            columns: &self.columns,
            delimiter: self.delimiter,
            quote: self.quote,
        }
    }
}

/// Schema plus bulk data making up a fixture database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSpec {
    schema: Utf8PathBuf,
    bulk_data: Vec<BulkDataFile>,
}

/// Errors raised while reading a fixture manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest existed but could not be read.
    #[error("failed to read fixture manifest {path}: {source}")]
    Read {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The manifest was not valid YAML for the expected shape.
    #[error("failed to parse fixture manifest {path}: {message}")]
    Parse {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default = "default_schema")]
    schema: Utf8PathBuf,
    #[serde(default)]
    bulk_data: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    table: String,
    file: Utf8PathBuf,
    columns: Vec<String>,
    #[serde(default = "default_delimiter")]
    delimiter: char,
    #[serde(default = "default_quote")]
    quote: char,
}

fn default_schema() -> Utf8PathBuf {
    Utf8PathBuf::from("structure.sql")
}

const fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

const fn default_quote() -> char {
    DEFAULT_QUOTE
}

impl FixtureSpec {
    /// Builds a spec from explicit parts.
    #[must_use]
    pub fn new(schema: impl Into<Utf8PathBuf>, bulk_data: Vec<BulkDataFile>) -> Self {
        Self {
            schema: schema.into(),
            bulk_data,
        }
    }

    /// The built-in fixture: `structure.sql` plus `data.tsv` into `people`.
    #[must_use]
    pub fn people(paths: &FixturePaths) -> Self {
        let columns = PEOPLE_COLUMNS
            .iter()
            .map(|column| (*column).to_owned())
            .collect();
        Self::new(
            paths.schema_path(),
            vec![BulkDataFile::new(
                PEOPLE_TABLE,
                paths.people_data_path(),
                columns,
                DEFAULT_DELIMITER,
                DEFAULT_QUOTE,
            )],
        )
    }

    /// Reads `sql/fixtures.yml` when present, otherwise returns
    /// [`Self::people`]. Manifest paths are relative to the SQL directory.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the manifest exists but cannot be read
    /// or parsed.
    pub fn load(paths: &FixturePaths) -> Result<Self, ManifestError> {
        let manifest_path = paths.manifest_path();
        let content = match fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::people(paths));
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: manifest_path,
                    source,
                });
            }
        };
        let manifest: Manifest =
            serde_saphyr::from_str(&content).map_err(|error| ManifestError::Parse {
                path: manifest_path.clone(),
                message: error.to_string(),
            })?;
        let sql_dir = paths.sql_dir();
        let bulk_data = manifest
            .bulk_data
            .into_iter()
            .map(|entry| {
                BulkDataFile::new(
                    entry.table,
                    sql_dir.join(entry.file),
                    entry.columns,
                    entry.delimiter,
                    entry.quote,
                )
            })
            .collect();
        Ok(Self::new(sql_dir.join(manifest.schema), bulk_data))
    }

    /// Schema DDL file.
    #[must_use]
    pub fn schema(&self) -> &Utf8Path {
        self.schema.as_path()
    }

    /// Bulk-load files in load order.
    #[must_use]
    pub fn bulk_data(&self) -> &[BulkDataFile] {
        &self.bulk_data
    }
}

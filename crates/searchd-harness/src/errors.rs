//! Error type for the harness CLI runtime.

use std::io;
use std::sync::Arc;

use searchd_harness_config::CredentialsError;
use thiserror::Error;

use crate::fixtures::{ManifestError, SetupError};
use crate::generator::GenerateError;
use crate::lifecycle::{LifecycleError, VersionParseError};
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to load database credentials: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("failed to load fixture manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("searchd lifecycle command failed: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("invalid sphinx_version setting: {0}")]
    Version(#[from] VersionParseError),
    #[error("failed to write command output: {0}")]
    Output(#[source] io::Error),
}

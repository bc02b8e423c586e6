//! Lifecycle of the external `searchd` daemon.
//!
//! The daemon is either stopped or running, and which one is never
//! remembered: [`DaemonController`] asks its injected [`DaemonState`] each
//! time, so a daemon restarted or killed behind the harness's back is seen
//! as it is. External tools run through the injected [`CommandRunner`],
//! which lets tests substitute both the process table and the tools.

mod controller;
mod error;
mod runner;
mod state;
mod version;

pub use controller::{
    ControllerSettings, DaemonController, IndexOutcome, StartOutcome, StopOutcome,
};
pub use error::LifecycleError;
pub use runner::{CommandOutput, CommandRunner, Invocation, SphinxBinaries, SystemRunner};
pub use state::{DaemonState, SystemDaemonState};
pub use version::{SphinxVersion, StopFlag, VersionParseError};

pub(crate) const LIFECYCLE_TARGET: &str = "searchd_harness::lifecycle";

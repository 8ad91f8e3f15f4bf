//! Run orchestration.
//!
//! This module provides the [`Runner`] that drives one run from image name to
//! exit status, and the launcher that starts and waits for the command.

mod config;
mod launcher;
mod lifecycle;
mod runner;

pub use config::RunConfig;
pub use launcher::{ExitStatus, IsolatedProcess, launch};
pub use lifecycle::{Lifecycle, RunPhase};
pub use runner::{RunOutcome, Runner};

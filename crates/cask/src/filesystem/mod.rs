//! Filesystem operations for runs.
//!
//! This module handles the per-run root directory that image layers are
//! assembled into and the command is isolated in.

mod rootfs;

pub use rootfs::{RootFilesystem, RootfsRetention};

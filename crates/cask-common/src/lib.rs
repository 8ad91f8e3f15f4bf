//! # cask-common
//!
//! Shared utilities and types for the Cask container launcher.
//!
//! This crate provides common functionality used across all Cask crates:
//! - The error taxonomy every stage of a run reports through
//! - Standard filesystem paths for the per-run root directory

#![warn(missing_docs)]

pub mod error;
pub mod paths;

pub use error::{CaskError, CaskResult};
pub use paths::CaskPaths;

//! # Cask Container Launcher
//!
//! Cask pulls an image from a registry, assembles its layers into a fresh
//! root directory and runs one command inside it, isolated from the host's
//! filesystem and process tree.
//!
//! ## Usage
//!
//! ```no_run
//! use cask::runtime::{RunConfig, Runner};
//! use cask_image::RegistryClient;
//!
//! # async fn example() -> cask_common::CaskResult<()> {
//! let runner = Runner::new(RegistryClient::docker_hub()?, RunConfig::default());
//! let outcome = runner
//!     .run("alpine", "/bin/sh", &["-c".to_string(), "echo hi".to_string()])
//!     .await?;
//! std::process::exit(outcome.status.code());
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod filesystem;
pub mod namespace;
pub mod runtime;

pub use runtime::{ExitStatus, Runner};

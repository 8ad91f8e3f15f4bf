//! # cask-image
//!
//! Image retrieval for Cask.
//!
//! This crate provides:
//! - Image reference resolution (`alpine` -> `library/alpine`)
//! - A registry client for bearer tokens, manifests and layer blobs
//! - Layer archive extraction into a flat root filesystem
//! - The pull pipeline tying those together in manifest order

#![warn(missing_docs)]

pub mod layer;
pub mod manifest;
/// Layer-by-layer root filesystem assembly.
pub mod pull;
pub mod reference;
/// Image registry client.
pub mod registry;

pub use manifest::{LayerDescriptor, Manifest};
pub use pull::{PullReport, Puller};
pub use reference::ImageReference;
pub use registry::{RegistryClient, RegistryConfig, RegistryToken};

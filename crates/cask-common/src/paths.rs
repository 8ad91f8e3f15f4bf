//! Standard filesystem paths for Cask.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::{CaskError, CaskResult};

/// Default base directory for per-run root filesystems.
pub static CASK_TMP_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("CASK_TMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
});

/// Prefix of every per-run root directory name.
pub const ROOTFS_PREFIX: &str = "jail";

/// Standard paths used by a run.
#[derive(Debug, Clone)]
pub struct CaskPaths {
    /// Base directory the root filesystem is created under.
    pub tmp: PathBuf,
}

impl Default for CaskPaths {
    fn default() -> Self {
        Self {
            tmp: CASK_TMP_DIR.clone(),
        }
    }
}

impl CaskPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom base directory.
    #[must_use]
    pub fn with_tmp(tmp: impl Into<PathBuf>) -> Self {
        Self { tmp: tmp.into() }
    }

    /// Location of the downloaded archive for `digest` inside `rootfs`.
    ///
    /// The digest is used verbatim as the file name, so anything that could
    /// name a path outside `rootfs` is rejected.
    pub fn layer_archive(rootfs: &Path, digest: &str) -> CaskResult<PathBuf> {
        let unusable = digest.is_empty()
            || digest == "."
            || digest == ".."
            || digest.contains(|c: char| c == '/' || c == '\0');
        if unusable {
            return Err(CaskError::Decode {
                what: "layer digest",
                message: format!("{digest:?} is not usable as a file name"),
            });
        }
        Ok(rootfs.join(digest))
    }
}

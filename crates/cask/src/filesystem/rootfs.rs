//! Root filesystem lifecycle.

use std::path::{Path, PathBuf};

use cask_common::paths::ROOTFS_PREFIX;
use cask_common::{CaskError, CaskResult};
use tempfile::TempDir;

/// What happens to the root directory when the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootfsRetention {
    /// Leave the assembled tree on disk.
    #[default]
    Keep,
    /// Delete the tree on every exit path of the run.
    Remove,
}

/// The directory an image is assembled into.
#[derive(Debug)]
pub struct RootFilesystem {
    path: PathBuf,
    // Removes the directory on drop when retention is `Remove`.
    guard: Option<TempDir>,
}

impl RootFilesystem {
    /// Create a fresh, uniquely named directory under `base`.
    pub fn create(base: &Path, retention: RootfsRetention) -> CaskResult<Self> {
        std::fs::create_dir_all(base).map_err(CaskError::filesystem("create", base))?;

        let dir = tempfile::Builder::new()
            .prefix(ROOTFS_PREFIX)
            .tempdir_in(base)
            .map_err(CaskError::filesystem("create", base))?;

        let rootfs = match retention {
            RootfsRetention::Keep => Self {
                path: dir.keep(),
                guard: None,
            },
            RootfsRetention::Remove => Self {
                path: dir.path().to_path_buf(),
                guard: Some(dir),
            },
        };

        tracing::debug!(path = %rootfs.path.display(), ?retention, "Created root filesystem");
        Ok(rootfs)
    }

    /// Location of the root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory outlives this value.
    #[must_use]
    pub const fn is_retained(&self) -> bool {
        self.guard.is_none()
    }
}

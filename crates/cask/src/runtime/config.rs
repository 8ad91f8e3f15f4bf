//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use cask_common::CaskPaths;

use crate::filesystem::RootfsRetention;
use crate::namespace::IsolationMode;

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Paths for run data.
    pub paths: CaskPaths,
    /// How the command is isolated.
    pub isolation: IsolationMode,
    /// What happens to the root filesystem afterwards.
    pub retention: RootfsRetention,
    /// Deadline for the command to finish.
    pub wait_timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            paths: CaskPaths::new(),
            isolation: IsolationMode::platform_default(),
            retention: RootfsRetention::Keep,
            wait_timeout: None,
        }
    }
}

impl RunConfig {
    /// Set the base directory for root filesystems.
    #[must_use]
    pub fn with_tmp(mut self, tmp: impl Into<PathBuf>) -> Self {
        self.paths = CaskPaths::with_tmp(tmp);
        self
    }

    /// Set the isolation mode.
    #[must_use]
    pub const fn with_isolation(mut self, isolation: IsolationMode) -> Self {
        self.isolation = isolation;
        self
    }

    /// Delete the root filesystem when the run ends.
    #[must_use]
    pub const fn remove_rootfs(mut self) -> Self {
        self.retention = RootfsRetention::Remove;
        self
    }

    /// Kill the command if it has not exited after `timeout`.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

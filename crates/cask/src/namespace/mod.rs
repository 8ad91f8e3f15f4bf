//! Process isolation backends.
//!
//! A backend decides how the launched command is cut off from the host:
//! - [`NamespaceIsolation`] (Linux): chroot into the root filesystem and a
//!   fresh PID namespace (CLONE_NEWPID) in which the command is PID 1
//! - [`ChrootIsolation`] (other Unix): chroot only, sharing the host's
//!   process tree
//! - [`HostIsolation`]: no isolation, the command is looked up inside the
//!   root filesystem and run from it

#[cfg(unix)]
mod chroot;
mod host;
#[cfg(target_os = "linux")]
mod pid;

#[cfg(unix)]
pub use chroot::ChrootIsolation;
pub use host::HostIsolation;
#[cfg(target_os = "linux")]
pub use pid::NamespaceIsolation;

use std::path::{Path, PathBuf};

use cask_common::CaskResult;
use tokio::process::Command;

/// Isolation level requested for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IsolationMode {
    /// New root filesystem and new PID namespace.
    Namespace,
    /// New root filesystem only.
    Chroot,
    /// No isolation.
    #[value(name = "none")]
    Host,
}

impl IsolationMode {
    /// Strongest mode the current platform supports.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(target_os = "linux") {
            Self::Namespace
        } else if cfg!(unix) {
            Self::Chroot
        } else {
            Self::Host
        }
    }
}

impl std::fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespace => write!(f, "namespace"),
            Self::Chroot => write!(f, "chroot"),
            Self::Host => write!(f, "none"),
        }
    }
}

/// A way of starting a command inside an assembled root filesystem.
pub trait Isolation: std::fmt::Debug + Send + Sync {
    /// The mode this backend implements.
    fn mode(&self) -> IsolationMode;

    /// Path handed to exec for `program`.
    fn program_path(&self, _rootfs: &Path, program: &str) -> PathBuf {
        PathBuf::from(program)
    }

    /// Arrange for the child to enter the sandbox before it execs.
    fn configure(&self, command: &mut Command, rootfs: &Path) -> CaskResult<()>;

    /// Runs on the spawning thread immediately before the child is forked.
    fn before_spawn(&self) -> CaskResult<()> {
        Ok(())
    }
}

/// Build the backend for `mode` on this platform.
pub fn for_mode(mode: IsolationMode) -> CaskResult<Box<dyn Isolation>> {
    match mode {
        #[cfg(target_os = "linux")]
        IsolationMode::Namespace => Ok(Box::new(NamespaceIsolation)),
        #[cfg(not(target_os = "linux"))]
        IsolationMode::Namespace => Err(cask_common::CaskError::Unsupported {
            feature: "PID namespaces".to_string(),
        }),
        #[cfg(unix)]
        IsolationMode::Chroot => Ok(Box::new(ChrootIsolation)),
        #[cfg(not(unix))]
        IsolationMode::Chroot => Err(cask_common::CaskError::Unsupported {
            feature: "chroot".to_string(),
        }),
        IsolationMode::Host => Ok(Box::new(HostIsolation)),
    }
}

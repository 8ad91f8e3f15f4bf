#![allow(unsafe_code)]
//! PID namespace handling.

use std::path::Path;

use cask_common::{CaskError, CaskResult};
use rustix::thread::UnshareFlags;
use tokio::process::Command;

use super::chroot::rebase_root;
use super::{Isolation, IsolationMode};

/// chroot plus a fresh PID namespace.
///
/// `unshare(CLONE_NEWPID)` only changes the namespace that *future children*
/// of the calling thread are created in, so it runs on the spawning thread
/// right before the fork and the child becomes PID 1 of the new namespace.
/// The calling thread cannot place a second child in that namespace once
/// PID 1 has exited; a run spawns exactly one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceIsolation;

impl Isolation for NamespaceIsolation {
    fn mode(&self) -> IsolationMode {
        IsolationMode::Namespace
    }

    fn configure(&self, command: &mut Command, rootfs: &Path) -> CaskResult<()> {
        rebase_root(command, rootfs)
    }

    fn before_spawn(&self) -> CaskResult<()> {
        let flags = UnshareFlags::NEWPID;

        // Safety: NEWPID does not alter the calling thread's own view of the
        // process tree, only where its next child is created.
        unsafe {
            rustix::thread::unshare_unsafe(flags).map_err(|e| CaskError::Launch {
                program: "pid namespace".to_string(),
                message: format!("Failed to unshare namespaces: {e}"),
            })?;
        }

        tracing::debug!(?flags, "Unshared namespaces");
        Ok(())
    }
}

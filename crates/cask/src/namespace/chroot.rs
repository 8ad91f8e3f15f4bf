#![allow(unsafe_code)]
//! Root filesystem rebasing.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use cask_common::{CaskError, CaskResult};
use tokio::process::Command;

use super::{Isolation, IsolationMode};

/// chroot-only isolation.
///
/// The child cannot see paths outside the root filesystem but shares the
/// host's process tree. Used where PID namespaces do not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChrootIsolation;

impl Isolation for ChrootIsolation {
    fn mode(&self) -> IsolationMode {
        IsolationMode::Chroot
    }

    fn configure(&self, command: &mut Command, rootfs: &Path) -> CaskResult<()> {
        tracing::warn!("PID namespaces unavailable; the command shares the host process tree");
        rebase_root(command, rootfs)
    }
}

/// Make the child chroot into `rootfs` and move to `/` before exec.
pub(super) fn rebase_root(command: &mut Command, rootfs: &Path) -> CaskResult<()> {
    let root = CString::new(rootfs.as_os_str().as_bytes()).map_err(|e| CaskError::Config {
        message: format!("Invalid root filesystem path: {e}"),
    })?;

    tracing::debug!(rootfs = %rootfs.display(), "Child will chroot before exec");

    // Safety: the closure runs between fork and exec and only issues the
    // chroot and chdir syscalls on a path allocated before the fork.
    unsafe {
        command.pre_exec(move || {
            rustix::process::chroot(root.as_c_str())?;
            rustix::process::chdir(c"/")?;
            Ok(())
        });
    }

    Ok(())
}

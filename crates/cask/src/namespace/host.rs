//! Unisolated execution.

use std::path::{Path, PathBuf};

use cask_common::CaskResult;
use tokio::process::Command;

use super::{Isolation, IsolationMode};

/// Runs the command on the host, resolved inside the root filesystem.
///
/// The program path is joined onto the root filesystem and the child starts
/// with the root filesystem as its working directory. Absolute symlinks inside
/// the image still resolve against the host, so this is a diagnostic mode for
/// unprivileged users rather than a sandbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIsolation;

impl Isolation for HostIsolation {
    fn mode(&self) -> IsolationMode {
        IsolationMode::Host
    }

    fn program_path(&self, rootfs: &Path, program: &str) -> PathBuf {
        rootfs.join(program.trim_start_matches('/'))
    }

    fn configure(&self, command: &mut Command, rootfs: &Path) -> CaskResult<()> {
        tracing::warn!("Running without isolation");
        command.current_dir(rootfs);
        Ok(())
    }
}

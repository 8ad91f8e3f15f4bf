//! Isolated command launch and exit status propagation.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use cask_common::{CaskError, CaskResult};
use tokio::process::{Child, Command};

use crate::namespace::Isolation;

/// How the launched command terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exited normally with a status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl ExitStatus {
    /// The status the launcher itself exits with.
    ///
    /// Signals map to `128 + signal`, as shells report them.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal,
        }
    }

    /// Whether the command exited with status 0.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Exited(1)
    }
}

/// A command running inside the root filesystem.
#[derive(Debug)]
pub struct IsolatedProcess {
    child: Child,
    program: String,
}

/// Start `program` inside `rootfs` under `isolation`.
///
/// stdin, stdout and stderr are inherited. Returns once the child has been
/// created; a program that does not exist inside the root filesystem fails
/// here.
pub fn launch(
    isolation: &dyn Isolation,
    rootfs: &Path,
    program: &str,
    args: &[String],
) -> CaskResult<IsolatedProcess> {
    let mut command = Command::new(isolation.program_path(rootfs, program));
    command
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    isolation.configure(&mut command, rootfs)?;

    tracing::debug!(
        program,
        ?args,
        rootfs = %rootfs.display(),
        isolation = %isolation.mode(),
        "Spawning process"
    );

    // No await between these two: the namespace change is per-thread.
    isolation.before_spawn()?;
    let child = command.spawn().map_err(|e| CaskError::Launch {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    tracing::debug!(pid = child.id(), program, "Process spawned");
    Ok(IsolatedProcess {
        child,
        program: program.to_string(),
    })
}

impl IsolatedProcess {
    /// Host PID of the child, while it has not been reaped.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Block until the command exits.
    ///
    /// With a `deadline`, a command still running when it elapses is killed
    /// and reaped, and the run fails with [`CaskError::Timeout`].
    pub async fn wait(mut self, deadline: Option<Duration>) -> CaskResult<ExitStatus> {
        let waited = match deadline {
            None => Some(self.child.wait().await),
            Some(limit) => tokio::time::timeout(limit, self.child.wait()).await.ok(),
        };

        let Some(status) = waited else {
            let limit = deadline.unwrap_or_default();
            tracing::warn!(program = %self.program, ?limit, "Deadline elapsed, killing process");
            self.child.kill().await.map_err(|e| CaskError::Internal {
                message: format!("Failed to kill {}: {e}", self.program),
            })?;
            return Err(CaskError::Timeout {
                operation: "waiting for the command",
                seconds: limit.as_secs(),
            });
        };

        let status = status.map_err(|e| CaskError::Internal {
            message: format!("wait error: {e}"),
        })?;

        let status = ExitStatus::from(status);
        tracing::debug!(program = %self.program, exit_code = status.code(), "Process exited");
        Ok(status)
    }
}

//! Run lifecycle tracking.

use cask_common::CaskError;

/// Phases of a run, in order.
///
/// Any failure jumps straight to [`RunPhase::Terminate`]; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Nothing has happened yet.
    Init,
    /// Resolving the image reference.
    Resolve,
    /// Fetching the bearer token.
    Auth,
    /// Fetching the manifest.
    Manifest,
    /// Downloading and extracting layers.
    Pull,
    /// Starting the isolated command.
    Launch,
    /// Waiting for the command.
    Wait,
    /// Run finished.
    Terminate,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Resolve => write!(f, "resolve"),
            Self::Auth => write!(f, "auth"),
            Self::Manifest => write!(f, "manifest"),
            Self::Pull => write!(f, "pull"),
            Self::Launch => write!(f, "launch"),
            Self::Wait => write!(f, "wait"),
            Self::Terminate => write!(f, "terminate"),
        }
    }
}

/// Current phase of a run.
#[derive(Debug)]
pub struct Lifecycle {
    phase: RunPhase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: RunPhase::Init,
        }
    }
}

impl Lifecycle {
    /// Start a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The phase the run is in.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Move forward to `next`.
    pub fn enter(&mut self, next: RunPhase) {
        debug_assert!(next > self.phase, "run phases only move forward");
        tracing::debug!(from = %self.phase, to = %next, "Run phase transition");
        self.phase = next;
    }

    /// The command exited; the run ends with its status.
    pub fn finish(&mut self, code: i32) {
        tracing::debug!(from = %self.phase, exit_code = code, "Run finished");
        self.phase = RunPhase::Terminate;
    }

    /// An internal failure ends the run with status 1.
    pub fn abort(&mut self, error: &CaskError) {
        tracing::debug!(from = %self.phase, error = %error, "Run aborted");
        self.phase = RunPhase::Terminate;
    }
}

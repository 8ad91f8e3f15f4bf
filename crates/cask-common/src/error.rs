//! Common error types for Cask.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`CaskError`].
pub type CaskResult<T> = Result<T, CaskError>;

/// Every internal failure of a run.
///
/// None of these are recovered locally: the launcher maps any of them to
/// exit status 1. A non-zero exit of the launched command is not an error
/// and never appears here.
#[derive(Error, Diagnostic, Debug)]
pub enum CaskError {
    /// Connection failure or unreadable response body.
    #[error("Network error: {message}")]
    #[diagnostic(code(cask::network))]
    Network {
        /// The error message.
        message: String,
    },

    /// The registry answered with a non-success status.
    #[error("Registry returned {status} for {url}")]
    #[diagnostic(
        code(cask::registry::status),
        help("Check that the image exists and is public")
    )]
    Registry {
        /// HTTP status code.
        status: u16,
        /// The URL that was requested.
        url: String,
    },

    /// A registry response body could not be decoded.
    #[error("Failed to decode {what}: {message}")]
    #[diagnostic(code(cask::decode))]
    Decode {
        /// The document being decoded (token, manifest, ...).
        what: &'static str,
        /// The error message.
        message: String,
    },

    /// A filesystem operation on the root directory failed.
    #[error("Failed to {operation} {}: {source}", path.display())]
    #[diagnostic(code(cask::filesystem))]
    Filesystem {
        /// The operation that failed.
        operation: &'static str,
        /// The path the operation targeted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(cask::io))]
    Io(#[from] std::io::Error),

    /// The command could not be started inside the root directory.
    #[error("Failed to launch {program}: {message}")]
    #[diagnostic(
        code(cask::launch),
        help("The executable must exist inside the image; isolation needs root privileges")
    )]
    Launch {
        /// The program that was being launched.
        program: String,
        /// The error message.
        message: String,
    },

    /// A configured deadline elapsed.
    #[error("Timed out after {seconds}s while {operation}")]
    #[diagnostic(code(cask::timeout))]
    Timeout {
        /// What was in progress.
        operation: &'static str,
        /// The deadline in seconds.
        seconds: u64,
    },

    /// Feature not supported on this platform.
    #[error("Feature not supported: {feature}")]
    #[diagnostic(
        code(cask::unsupported),
        help("Process isolation requires a Unix host; PID namespaces require Linux")
    )]
    Unsupported {
        /// The unsupported feature.
        feature: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cask::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("Internal error: {message}")]
    #[diagnostic(code(cask::internal), help("This is a bug, please report it"))]
    Internal {
        /// The error message.
        message: String,
    },
}

impl CaskError {
    /// Build a [`CaskError::Filesystem`] from an I/O error.
    pub fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem {
            operation,
            path,
            source,
        }
    }
}

impl From<serde_json::Error> for CaskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            what: "JSON document",
            message: err.to_string(),
        }
    }
}

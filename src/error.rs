//! Error types for framework signing.
//!
//! Every failure is fatal to the run. Nothing here is retried: the only
//! recovery path is re-running the whole pipeline from scratch.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Result type alias for framework_codesign operations
pub type Result<T> = std::result::Result<T, SignError>;

/// Main error type for all signing operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SignError {
    /// The run refused to start. Nothing on disk was touched.
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "changing owner of")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// The signing tool could not be started at all.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// The signing tool ran and exited non-zero.
    #[error("{tool} failed on {path} (exit status {}): {stderr}", describe_status(.status))]
    ToolFailed {
        /// Tool name (`codesign`, `productsign`)
        tool: String,
        /// Artifact being signed
        path: PathBuf,
        /// Exit code, `None` if the tool was killed by a signal
        status: Option<i32>,
        /// Diagnostic stream of the tool, verbatim
        stderr: String,
    },

    /// Error walking the bundle tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Property list serialization error.
    #[error("{0}")]
    Plist(#[from] plist::Error),

    /// The run was interrupted by a signal before completing.
    #[error("interrupted by {signal}")]
    Interrupted {
        /// Name of the signal received
        signal: &'static str,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Conditions checked before any mutation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreconditionError {
    /// The process is not running as root
    #[error("must run as root to normalize ownership and sign (effective uid is {euid})")]
    NotPrivileged {
        /// Effective uid of the process
        euid: u32,
    },

    /// No signing identity was supplied
    #[error("no signing identity specified")]
    MissingIdentity,
}

impl SignError {
    /// Process exit status for this error.
    ///
    /// Signing failures propagate the tool's own status; everything else is 1,
    /// except interruption which follows the shell convention of 128 + signo.
    pub fn exit_code(&self) -> i32 {
        match self {
            SignError::ToolFailed {
                status: Some(code), ..
            } if *code != 0 => *code,
            SignError::Interrupted { signal: "SIGTERM" } => 143,
            SignError::Interrupted { .. } => 130,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            SignError::Precondition(PreconditionError::NotPrivileged { .. }) => vec![
                "Re-run with sudo so ownership can be set to root:admin".to_string(),
            ],
            SignError::Precondition(PreconditionError::MissingIdentity) => vec![
                "Pass a Developer ID Application certificate name with --sign-binaries".to_string(),
                "List available identities: security find-identity -v -p codesigning".to_string(),
            ],
            SignError::ToolFailed { .. } => vec![
                "Check that the identity exists in the keychain and is valid".to_string(),
                "The bundle is partially signed; re-run the whole signing pass".to_string(),
            ],
            SignError::CommandFailed { .. } => vec![
                "Install the Xcode command line tools: xcode-select --install".to_string(),
            ],
            _ => vec![],
        }
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the
    /// operation, e.g. "reading directory".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| SignError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_propagates_status() {
        let err = SignError::ToolFailed {
            tool: "codesign".to_string(),
            path: PathBuf::from("/tmp/x"),
            status: Some(3),
            stderr: "no identity found".to_string(),
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("no identity found"));
    }

    #[test]
    fn test_killed_tool_exits_one() {
        let err = SignError::ToolFailed {
            tool: "codesign".to_string(),
            path: PathBuf::from("/tmp/x"),
            status: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("exit status signal"));
    }

    #[test]
    fn test_precondition_exit_code() {
        let err = SignError::from(PreconditionError::MissingIdentity);
        assert_eq!(err.exit_code(), 1);
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_interrupted_exit_codes() {
        assert_eq!(SignError::Interrupted { signal: "SIGINT" }.exit_code(), 130);
        assert_eq!(SignError::Interrupted { signal: "SIGTERM" }.exit_code(), 143);
    }
}

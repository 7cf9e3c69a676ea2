//! Error types for podrun-exec

use thiserror::Error;

/// Errors that can occur while running a remote command
#[derive(Error, Debug)]
pub enum ExecError {
    /// Command payload exceeds the safe size for one exec session.
    ///
    /// Writes at or above the limit have been observed to wedge the
    /// multiplexed connection, so the guard rejects them before any
    /// network activity.
    #[error("command is {len} bytes, must be under {limit}")]
    CommandTooLarge {
        /// Byte length of the rejected command
        len: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Command does not end with a newline, so the remote shell's
    /// line-based read would stall instead of evaluating it
    #[error("command must end with a newline")]
    MissingNewline,

    /// Command never tells the remote shell to exit. Stdin is not closed
    /// by the writer, so without it the session hangs indefinitely
    #[error("command must contain an exit instruction")]
    MissingExit,

    /// Failure from the Kubernetes client (connection, auth, not-found)
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),

    /// I/O error on a sub-channel
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The exec stream came up without a writable stdin channel
    #[error("exec stream has no stdin channel")]
    StdinUnavailable,

    /// Bytes accumulated from the error channel are not a well-formed
    /// status object
    #[error("status payload did not decode: {0}")]
    StatusDecode(#[source] serde_json::Error),

    /// Status decoded and reported failure, but carried no parsable
    /// exit code
    #[error("status reported failure without an exit code: {message}")]
    ExitCodeUnavailable {
        /// Human-readable message from the status object, if any
        message: String,
    },
}

impl ExecError {
    /// Check if the error was caught before any network activity
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExecError::CommandTooLarge { .. } | ExecError::MissingNewline | ExecError::MissingExit
        )
    }
}

//! Status payload carried on the exec error channel
//!
//! When the remote process ends, the exec sub-protocol writes the control
//! plane's generic outcome object onto the error channel and closes it.
//! The exit code rides inside that object rather than on a channel of its
//! own: a failing process shows up as reason `NonZeroExitCode` with a
//! cause whose `message` holds the code as decimal text.

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// Outcome marker for a completed operation
pub const STATUS_SUCCESS: &str = "Success";
/// Outcome marker for a failed operation
pub const STATUS_FAILURE: &str = "Failure";
/// Reason set when the remote process exited non-zero
pub const REASON_NON_ZERO_EXIT_CODE: &str = "NonZeroExitCode";
/// Cause reason whose message carries the numeric exit code
pub const CAUSE_EXIT_CODE: &str = "ExitCode";

/// Structured status decoded from the error channel
///
/// Mirrors the wire shape of the control plane's status object; unknown
/// fields (`kind`, `apiVersion`, `metadata`, ...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecStatus {
    /// `"Success"` or `"Failure"`
    pub status: Option<String>,
    /// Human-readable description of the outcome
    pub message: Option<String>,
    /// Machine-readable reason for a failure
    pub reason: Option<String>,
    /// Extra detail entries, one of which may carry the exit code
    pub details: Option<StatusDetails>,
}

/// Detail block of a status object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusDetails {
    /// Individual causes contributing to the outcome
    #[serde(default)]
    pub causes: Vec<StatusCause>,
}

/// One cause entry within status details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCause {
    /// Machine-readable cause category
    pub reason: Option<String>,
    /// Cause payload; holds the exit code as decimal text when `reason`
    /// is `ExitCode`
    pub message: Option<String>,
}

impl ExecStatus {
    /// Decode a status object from raw error-channel bytes
    ///
    /// # Errors
    /// Returns `ExecError::StatusDecode` if the bytes are not a
    /// well-formed status object. An empty payload fails the same way.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ExecError> {
        serde_json::from_slice(bytes).map_err(ExecError::StatusDecode)
    }

    /// Extract the process exit code
    ///
    /// A `Success` outcome with no code means the process exited zero. A
    /// `NonZeroExitCode` failure yields the code from the first
    /// `ExitCode` cause. Any other shape is surfaced as
    /// `ExitCodeUnavailable` rather than guessed at.
    ///
    /// # Errors
    /// Returns `ExecError::ExitCodeUnavailable` when the status reports
    /// failure without a parsable code.
    pub fn exit_code(&self) -> Result<i32, ExecError> {
        if self.status.as_deref() == Some(STATUS_SUCCESS) {
            return Ok(0);
        }

        if self.reason.as_deref() == Some(REASON_NON_ZERO_EXIT_CODE) {
            if let Some(details) = &self.details {
                for cause in &details.causes {
                    if cause.reason.as_deref() != Some(CAUSE_EXIT_CODE) {
                        continue;
                    }
                    if let Some(code) = cause.message.as_deref().and_then(|m| m.parse().ok()) {
                        return Ok(code);
                    }
                }
            }
        }

        Err(ExecError::ExitCodeUnavailable {
            message: self
                .message
                .clone()
                .or_else(|| self.reason.clone())
                .unwrap_or_else(|| "no further detail".to_string()),
        })
    }
}

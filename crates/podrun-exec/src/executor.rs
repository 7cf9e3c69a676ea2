//! Remote command execution over a multiplexed exec stream

use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::status::ExecStatus;
use crate::target::ExecTarget;
use crate::traits::{ExecTransport, MuxedStream};

/// Shell launched on the remote side
///
/// Deliberately not the image's `/bin/sh`: the Almquist shells bundled in
/// several container distros cut line input at 1024 bytes, while bash
/// accepts far more. Callers do not get to pick a different shell.
pub const REMOTE_SHELL: &str = "/bin/bash";

/// Default ceiling for one command payload, in bytes
///
/// Sessions writing this much or more have been observed to wedge the
/// multiplexed connection. The threshold is empirical, not a documented
/// protocol limit, so the guard stays conservative.
pub const DEFAULT_MAX_COMMAND_BYTES: usize = 4096;

/// Runs single shell commands inside remote containers
///
/// One call opens one exec stream, writes the command to the remote
/// shell's stdin, drains the status-carrying error channel, and returns
/// the process exit code. Concurrent calls are independent; nothing is
/// shared between them but the transport handle.
pub struct RemoteExecutor<T: ExecTransport> {
    transport: T,
    max_command_bytes: usize,
}

impl<T: ExecTransport> RemoteExecutor<T> {
    /// Create an executor over the given transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_command_bytes: DEFAULT_MAX_COMMAND_BYTES,
        }
    }

    /// Override the command payload ceiling
    ///
    /// The default is conservative; only raise it after verifying the
    /// deployed transport path actually tolerates larger writes.
    #[must_use]
    pub fn with_max_command_bytes(mut self, limit: usize) -> Self {
        self.max_command_bytes = limit;
        self
    }

    /// Execute a command and return its exit code
    ///
    /// `command` must be a complete shell command line: under the payload
    /// ceiling, ending in a newline, and containing an `exit` instruction
    /// so the remote shell terminates (its stdin is never closed).
    ///
    /// Stdout is discarded. There is no timeout; callers needing a bounded
    /// wait must layer one externally and accept that the underlying
    /// stream may stay open after it fires.
    ///
    /// # Errors
    /// Validation failures are returned before any transport activity.
    /// Transport failures propagate unchanged. A status payload that does
    /// not decode, or decodes without a usable exit code, is reported as
    /// its own failure rather than coerced to a default code.
    #[instrument(skip(self, command), fields(target = %target))]
    pub async fn execute(&self, target: &ExecTarget, command: &str) -> Result<i32, ExecError> {
        self.validate_command(command)?;

        debug!(bytes = command.len(), "opening exec stream");
        let shell = vec![REMOTE_SHELL.to_string()];
        let mut stream = self.transport.open(target, &shell).await?;

        let outcome = run_session(&mut stream, command).await;

        // Release on every path; a close failure never masks the outcome.
        if let Err(err) = stream.close().await {
            warn!(error = %err, "failed to close exec stream");
        }

        if let Ok(code) = &outcome {
            debug!(code = *code, "remote command completed");
        }
        outcome
    }

    /// Execute a command, blocking the calling thread
    ///
    /// Runs [`execute`](Self::execute) to completion on a dedicated
    /// runtime owned by this call. Must not be invoked from within an
    /// async context: the wait would depend on a scheduler this call is
    /// itself occupying, so tokio panics instead of deadlocking. Callers
    /// already on a runtime use [`execute`](Self::execute) directly.
    ///
    /// # Errors
    /// Same failure surface as [`execute`](Self::execute).
    pub fn execute_blocking(&self, target: &ExecTarget, command: &str) -> Result<i32, ExecError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute(target, command))
    }

    fn validate_command(&self, command: &str) -> Result<(), ExecError> {
        if command.len() >= self.max_command_bytes {
            return Err(ExecError::CommandTooLarge {
                len: command.len(),
                limit: self.max_command_bytes,
            });
        }
        if !command.ends_with('\n') {
            return Err(ExecError::MissingNewline);
        }
        if !command.contains("exit") {
            return Err(ExecError::MissingExit);
        }
        Ok(())
    }
}

/// Drive one session: write, flush, drain the status channel, decode
async fn run_session<S: MuxedStream>(stream: &mut S, command: &str) -> Result<i32, ExecError> {
    stream.write_stdin(command.as_bytes()).await?;
    stream.flush_stdin().await?;

    let raw = stream.read_status_channel().await?;
    let status = ExecStatus::from_slice(&raw)?;
    status.exit_code()
}

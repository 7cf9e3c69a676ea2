//! Transport traits for remote execution

use async_trait::async_trait;

use crate::error::ExecError;
use crate::target::ExecTarget;

/// Opens multiplexed exec streams against a cluster
///
/// The production implementation talks to the pod-exec API; tests
/// substitute stubs to drive the executor without a cluster.
#[async_trait]
pub trait ExecTransport: Send + Sync {
    /// Stream type produced by `open`
    type Stream: MuxedStream;

    /// Open one exec stream running `command` in the target container
    ///
    /// Only the input sub-channel is attached for streaming; stdout is
    /// discarded and the error channel is consumed as the status carrier.
    ///
    /// # Errors
    /// Transport-level failures (connection, auth, not-found) propagate
    /// unchanged.
    async fn open(
        &self,
        target: &ExecTarget,
        command: &[String],
    ) -> Result<Self::Stream, ExecError>;
}

/// One in-flight exec session over a multiplexed stream
///
/// A stream serves exactly one command: write, flush, drain the error
/// channel, close. It is never reused.
#[async_trait]
pub trait MuxedStream: Send {
    /// Write bytes to the input sub-channel
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), ExecError>;

    /// Flush the input sub-channel
    ///
    /// The transport may buffer writes; a command is not guaranteed
    /// visible to the remote process until flushed.
    async fn flush_stdin(&mut self) -> Result<(), ExecError>;

    /// Read the error sub-channel to end-of-stream
    ///
    /// Returns the raw accumulated payload. Despite the channel's name
    /// this is the final structured status object, not free-form error
    /// text.
    async fn read_status_channel(&mut self) -> Result<Vec<u8>, ExecError>;

    /// Release the stream and its sub-channel handles
    async fn close(&mut self) -> Result<(), ExecError>;
}

//! podrun-exec: single-shot command execution inside Kubernetes containers
//!
//! Opens one multiplexed exec stream per command, writes the command to a
//! remote shell's stdin, and extracts the process exit code from the
//! structured status object the exec protocol delivers on the error
//! channel. Stdout is discarded; there are no interactive sessions and no
//! retries.
//!
//! The blocking entry points run the async sequence on a runtime they own;
//! calling them from within an async context is unsupported (see
//! [`RemoteExecutor::execute_blocking`]).

pub mod error;
pub mod executor;
pub mod kubernetes;
pub mod status;
pub mod target;
pub mod traits;

pub use error::ExecError;
pub use executor::{DEFAULT_MAX_COMMAND_BYTES, REMOTE_SHELL, RemoteExecutor};
pub use kubernetes::{KubeTransport, run_command, run_command_blocking};
pub use status::ExecStatus;
pub use target::ExecTarget;
pub use traits::{ExecTransport, MuxedStream};

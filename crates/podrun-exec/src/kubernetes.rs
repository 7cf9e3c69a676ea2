//! Kubernetes pod-exec transport
//!
//! Drives the executor over the cluster's pod-exec subresource using the
//! kube crate's websocket support.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::api::{Api, AttachParams, AttachedProcess};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::instrument;

use crate::error::ExecError;
use crate::executor::RemoteExecutor;
use crate::target::ExecTarget;
use crate::traits::{ExecTransport, MuxedStream};

/// Exec transport backed by the pod-exec API
#[derive(Clone)]
pub struct KubeTransport {
    client: Client,
}

impl KubeTransport {
    /// Create a transport over an already-authenticated client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecTransport for KubeTransport {
    type Stream = KubeExecStream;

    #[instrument(skip(self, command), fields(target = %target))]
    async fn open(
        &self,
        target: &ExecTarget,
        command: &[String],
    ) -> Result<KubeExecStream, ExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);

        // Attach stdin only. Stdout is discarded server-side, and the
        // error channel delivers the final status object regardless.
        let params = AttachParams::default()
            .container(&target.container)
            .stdin(true)
            .stdout(false)
            .stderr(false);

        let mut process = pods.exec(&target.pod, command, &params).await?;
        let stdin = process
            .stdin()
            .map(|writer| Box::new(writer) as Box<dyn AsyncWrite + Send + Unpin>)
            .ok_or(ExecError::StdinUnavailable)?;

        Ok(KubeExecStream {
            process: Some(process),
            stdin: Some(stdin),
        })
    }
}

/// One exec session against a pod
pub struct KubeExecStream {
    process: Option<AttachedProcess>,
    stdin: Option<Box<dyn AsyncWrite + Send + Unpin>>,
}

#[async_trait]
impl MuxedStream for KubeExecStream {
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), ExecError> {
        let stdin = self.stdin.as_mut().ok_or(ExecError::StdinUnavailable)?;
        stdin.write_all(data).await?;
        Ok(())
    }

    async fn flush_stdin(&mut self) -> Result<(), ExecError> {
        let stdin = self.stdin.as_mut().ok_or(ExecError::StdinUnavailable)?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_status_channel(&mut self) -> Result<Vec<u8>, ExecError> {
        // The kube client owns the websocket demux and hands the status
        // object back already parsed, so the raw payload is reconstructed
        // from its parsed form. A status the client could not parse, or a
        // stream that closed without one, comes out as an empty payload
        // and fails decoding upstream.
        let status = match self.process.as_mut().and_then(AttachedProcess::take_status) {
            Some(pending) => pending.await,
            None => None,
        };

        match status {
            Some(status) => serde_json::to_vec(&status).map_err(ExecError::StatusDecode),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        // Dropping the writer and the attached process tears down the
        // websocket; the remote side is not waited on.
        self.stdin = None;
        self.process = None;
        Ok(())
    }
}

/// Run a shell command in a container and return its exit code
///
/// `command` must satisfy the executor's payload contract: under the
/// default byte ceiling, newline-terminated, and containing an `exit`
/// instruction.
///
/// # Errors
/// See [`RemoteExecutor::execute`].
pub async fn run_command(
    client: Client,
    namespace: &str,
    pod: &str,
    container: &str,
    command: &str,
) -> Result<i32, ExecError> {
    let target = ExecTarget::new(namespace, pod, container);
    RemoteExecutor::new(KubeTransport::new(client))
        .execute(&target, command)
        .await
}

/// Blocking variant of [`run_command`]
///
/// Owns a private runtime for the duration of the call. Must not be
/// invoked from within an async context; use [`run_command`] there
/// instead.
///
/// # Errors
/// See [`RemoteExecutor::execute`].
pub fn run_command_blocking(
    client: Client,
    namespace: &str,
    pod: &str,
    container: &str,
    command: &str,
) -> Result<i32, ExecError> {
    let target = ExecTarget::new(namespace, pod, container);
    RemoteExecutor::new(KubeTransport::new(client)).execute_blocking(&target, command)
}

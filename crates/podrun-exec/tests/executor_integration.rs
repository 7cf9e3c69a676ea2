use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use podrun_exec::error::ExecError;
use podrun_exec::executor::{DEFAULT_MAX_COMMAND_BYTES, REMOTE_SHELL, RemoteExecutor};
use podrun_exec::target::ExecTarget;
use podrun_exec::traits::{ExecTransport, MuxedStream};

// Stub transport

/// Observations shared between a stub transport and its streams
#[derive(Default)]
struct StubState {
    opens: AtomicUsize,
    closed: AtomicBool,
    written: Mutex<Vec<u8>>,
    command: Mutex<Option<Vec<String>>>,
}

#[derive(Clone)]
struct StubTransport {
    status_payload: Vec<u8>,
    fail_open: bool,
    state: Arc<StubState>,
}

impl StubTransport {
    fn new(status_payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status_payload: status_payload.into(),
            fail_open: false,
            state: Arc::new(StubState::default()),
        }
    }

    fn success() -> Self {
        Self::new(br#"{"status":"Success"}"#.as_slice())
    }

    fn exit_code(code: i32) -> Self {
        Self::new(format!(
            r#"{{"status":"Failure","reason":"NonZeroExitCode","details":{{"causes":[{{"reason":"ExitCode","message":"{code}"}}]}}}}"#
        ))
    }

    fn failure_without_code() -> Self {
        Self::new(br#"{"status":"Failure","message":"the pod went away"}"#.as_slice())
    }

    fn malformed() -> Self {
        Self::new(b"not a status object".as_slice())
    }

    fn refusing_connections() -> Self {
        let mut stub = Self::success();
        stub.fail_open = true;
        stub
    }

    fn state(&self) -> Arc<StubState> {
        self.state.clone()
    }
}

#[async_trait]
impl ExecTransport for StubTransport {
    type Stream = StubStream;

    async fn open(
        &self,
        _target: &ExecTarget,
        command: &[String],
    ) -> Result<StubStream, ExecError> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(ExecError::Kube(kube::Error::Api(
                kube::core::Status::failure("connection refused", "ServiceUnavailable")
                    .with_code(503)
                    .boxed(),
            )));
        }
        *self.state.command.lock().unwrap() = Some(command.to_vec());
        Ok(StubStream {
            status_payload: self.status_payload.clone(),
            state: self.state.clone(),
        })
    }
}

struct StubStream {
    status_payload: Vec<u8>,
    state: Arc<StubState>,
}

#[async_trait]
impl MuxedStream for StubStream {
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), ExecError> {
        self.state.written.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    async fn flush_stdin(&mut self) -> Result<(), ExecError> {
        Ok(())
    }

    async fn read_status_channel(&mut self) -> Result<Vec<u8>, ExecError> {
        Ok(self.status_payload.clone())
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn target() -> ExecTarget {
    ExecTarget::new("default", "worker-0", "app")
}

const COMMAND: &str = "touch /tmp/ready\nexit $?\n";

// Validation happens before any transport activity

#[tokio::test]
async fn oversized_command_never_reaches_the_transport() {
    let stub = StubTransport::success();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let command = format!("true {}\nexit\n", "x".repeat(DEFAULT_MAX_COMMAND_BYTES));
    let err = executor.execute(&target(), &command).await.unwrap_err();

    assert!(matches!(err, ExecError::CommandTooLarge { .. }));
    assert_eq!(state.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn command_without_newline_never_reaches_the_transport() {
    let stub = StubTransport::success();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let err = executor
        .execute(&target(), "touch /tmp/ready; exit")
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::MissingNewline));
    assert_eq!(state.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn command_without_exit_never_reaches_the_transport() {
    let stub = StubTransport::success();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let err = executor
        .execute(&target(), "touch /tmp/ready\n")
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::MissingExit));
    assert_eq!(state.opens.load(Ordering::SeqCst), 0);
}

// Happy paths

#[tokio::test]
async fn successful_status_yields_zero() {
    let stub = StubTransport::success();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let code = executor.execute(&target(), COMMAND).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(state.opens.load(Ordering::SeqCst), 1);
    assert_eq!(*state.written.lock().unwrap(), COMMAND.as_bytes());
    assert!(state.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn non_zero_exit_code_is_returned() {
    let executor = RemoteExecutor::new(StubTransport::exit_code(17));
    let code = executor.execute(&target(), COMMAND).await.unwrap();
    assert_eq!(code, 17);
}

#[tokio::test]
async fn executor_always_commands_bash() {
    let stub = StubTransport::success();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    executor.execute(&target(), COMMAND).await.unwrap();

    let command = state.command.lock().unwrap().clone().unwrap();
    assert_eq!(command, vec![REMOTE_SHELL.to_string()]);
}

// Failure surfaces

#[tokio::test]
async fn malformed_status_fails_decoding_and_closes_the_stream() {
    let stub = StubTransport::malformed();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let err = executor.execute(&target(), COMMAND).await.unwrap_err();

    assert!(matches!(err, ExecError::StatusDecode(_)));
    assert!(state.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failure_without_code_is_surfaced_not_defaulted() {
    let stub = StubTransport::failure_without_code();
    let state = stub.state();
    let executor = RemoteExecutor::new(stub);

    let err = executor.execute(&target(), COMMAND).await.unwrap_err();

    assert!(matches!(
        err,
        ExecError::ExitCodeUnavailable { ref message } if message == "the pod went away"
    ));
    assert!(state.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn transport_failure_propagates_unchanged() {
    let executor = RemoteExecutor::new(StubTransport::refusing_connections());
    let err = executor.execute(&target(), COMMAND).await.unwrap_err();
    assert!(matches!(err, ExecError::Kube(_)));
}

// Independent concurrent sessions

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_independent() {
    let mut handles = Vec::new();

    for code in 1..=8 {
        handles.push(tokio::spawn(async move {
            let stub = StubTransport::exit_code(code);
            let state = stub.state();
            let executor = RemoteExecutor::new(stub);
            let target = ExecTarget::new("default", format!("worker-{code}"), "app");

            let got = executor.execute(&target, COMMAND).await.unwrap();
            assert_eq!(state.opens.load(Ordering::SeqCst), 1);
            (code, got)
        }));
    }

    for handle in handles {
        let (expected, got) = handle.await.unwrap();
        assert_eq!(expected, got);
    }
}

// Blocking adapter mirrors the async entry point

fn outcome_label(result: &Result<i32, ExecError>) -> String {
    match result {
        Ok(code) => format!("ok:{code}"),
        Err(ExecError::CommandTooLarge { .. }) => "too-large".to_string(),
        Err(ExecError::MissingNewline) => "missing-newline".to_string(),
        Err(ExecError::MissingExit) => "missing-exit".to_string(),
        Err(ExecError::StatusDecode(_)) => "status-decode".to_string(),
        Err(ExecError::ExitCodeUnavailable { .. }) => "exit-code-unavailable".to_string(),
        Err(ExecError::Kube(_)) => "transport".to_string(),
        Err(other) => format!("other:{other}"),
    }
}

fn scenarios() -> Vec<(&'static str, StubTransport, &'static str, &'static str)> {
    let oversized = "true x\nexit\n";
    vec![
        ("success", StubTransport::success(), COMMAND, "ok:0"),
        ("exit-17", StubTransport::exit_code(17), COMMAND, "ok:17"),
        (
            "malformed",
            StubTransport::malformed(),
            COMMAND,
            "status-decode",
        ),
        (
            "no-code",
            StubTransport::failure_without_code(),
            COMMAND,
            "exit-code-unavailable",
        ),
        (
            "no-newline",
            StubTransport::success(),
            "true; exit",
            "missing-newline",
        ),
        ("no-exit", StubTransport::success(), "true\n", "missing-exit"),
        ("oversized", StubTransport::success(), oversized, "too-large"),
        (
            "refused",
            StubTransport::refusing_connections(),
            COMMAND,
            "transport",
        ),
    ]
}

#[test]
fn blocking_entry_point_matches_async_outcomes() {
    for (name, stub, command, expected) in scenarios() {
        let executor = RemoteExecutor::new(stub).with_max_command_bytes(
            if name == "oversized" { 4 } else { DEFAULT_MAX_COMMAND_BYTES },
        );

        let blocking = executor.execute_blocking(&target(), command);
        assert_eq!(outcome_label(&blocking), expected, "scenario {name}");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let asynchronous = runtime.block_on(executor.execute(&target(), command));
        assert_eq!(outcome_label(&asynchronous), expected, "scenario {name}");
    }
}

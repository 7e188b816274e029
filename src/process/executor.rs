//! Child process execution with an observable event stream.
//!
//! [`execute_process`] spawns a command, forwards each chunk of stdout or
//! stderr to an optional observer as it arrives, and then emits exactly one
//! terminal event: `Complete` on exit code 0, `Error` otherwise.

use crate::error::{ProcessExecutionError, ProcessFailureKind};
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// What to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Working directory. Defaults to the current directory.
    pub cwd: Option<PathBuf>,
    /// Kill the process after this long.
    pub timeout: Option<Duration>,
}

impl ProcessConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// A chunk of output, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub data: String,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
    pub duration: Duration,
}

/// Lifecycle notification: zero or more `Data`, then one `Complete` or `Error`.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Data(OutputChunk),
    Complete(ProcessOutput),
    Error(ProcessExecutionError),
}

impl ProcessEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessEvent::Data(_))
    }
}

/// Receiving side is free to be dropped; events are then discarded.
pub type ProcessObserver = mpsc::UnboundedSender<ProcessEvent>;

/// Run a process to completion.
///
/// Resolves with the captured output on exit code 0. Spawn failure, a
/// non-zero exit, a terminating signal, or a timeout resolve to
/// [`ProcessExecutionError`] carrying the output collected so far.
pub async fn execute_process(
    config: &ProcessConfig,
    observer: Option<&ProcessObserver>,
) -> Result<ProcessOutput, ProcessExecutionError> {
    let result = run(config, observer).await;

    if let Some(observer) = observer {
        let event = match &result {
            Ok(output) => ProcessEvent::Complete(output.clone()),
            Err(err) => ProcessEvent::Error(err.clone()),
        };
        let _ = observer.send(event);
    }

    result
}

#[derive(Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Captured {
    fn push(&mut self, stream: OutputStream, bytes: &[u8]) {
        match stream {
            OutputStream::Stdout => self.stdout.extend_from_slice(bytes),
            OutputStream::Stderr => self.stderr.extend_from_slice(bytes),
        }
    }

    fn into_strings(self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }
}

fn failure(
    config: &ProcessConfig,
    kind: ProcessFailureKind,
    captured: Captured,
    code: Option<i32>,
    started: Instant,
) -> ProcessExecutionError {
    let (stdout, stderr) = captured.into_strings();
    ProcessExecutionError {
        command: config.to_string(),
        kind,
        stdout,
        stderr,
        code,
        duration: started.elapsed(),
    }
}

fn forward(
    captured: &mut Captured,
    observer: Option<&ProcessObserver>,
    stream: OutputStream,
    bytes: Vec<u8>,
) {
    captured.push(stream, &bytes);
    if let Some(observer) = observer {
        let _ = observer.send(ProcessEvent::Data(OutputChunk {
            stream,
            data: String::from_utf8_lossy(&bytes).into_owned(),
        }));
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn run(
    config: &ProcessConfig,
    observer: Option<&ProcessObserver>,
) -> Result<ProcessOutput, ProcessExecutionError> {
    let started = Instant::now();

    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref cwd) = config.cwd {
        cmd.current_dir(cwd);
    }

    debug!(command = %config, "spawning process");

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Err(failure(
                config,
                ProcessFailureKind::Spawn(e.to_string()),
                Captured::default(),
                None,
                started,
            ))
        }
    };

    // Both pipes feed one channel so chunks are observed in arrival order.
    let (tx, mut rx) = mpsc::unbounded_channel::<(OutputStream, Vec<u8>)>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump(stdout, OutputStream::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump(stderr, OutputStream::Stderr, tx.clone()));
    }
    drop(tx);

    let deadline = config.timeout.map(|timeout| started + timeout);
    let timer = deadline_reached(deadline);
    tokio::pin!(timer);

    let mut captured = Captured::default();
    let mut timed_out = false;

    loop {
        tokio::select! {
            chunk = rx.recv() => match chunk {
                Some((stream, bytes)) => forward(&mut captured, observer, stream, bytes),
                None => break,
            },
            _ = &mut timer => {
                timed_out = true;
                break;
            }
        }
    }

    let status = if timed_out {
        None
    } else {
        tokio::select! {
            status = child.wait() => Some(status),
            _ = &mut timer => None,
        }
    };

    let Some(status) = status else {
        if let Err(e) = child.kill().await {
            warn!(command = %config, error = %e, "failed to kill timed-out process");
        }
        while let Ok((stream, bytes)) = rx.try_recv() {
            forward(&mut captured, observer, stream, bytes);
        }
        let limit_ms = config.timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
        return Err(failure(
            config,
            ProcessFailureKind::Timeout(limit_ms),
            captured,
            None,
            started,
        ));
    };

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            return Err(failure(
                config,
                ProcessFailureKind::Io(e.to_string()),
                captured,
                None,
                started,
            ))
        }
    };

    debug!(
        command = %config,
        code = ?status.code(),
        duration_ms = started.elapsed().as_millis() as u64,
        "process exited"
    );

    if status.success() {
        let (stdout, stderr) = captured.into_strings();
        return Ok(ProcessOutput {
            stdout,
            stderr,
            code: 0,
            duration: started.elapsed(),
        });
    }

    let kind = match (status.code(), terminating_signal(&status)) {
        (Some(code), _) => ProcessFailureKind::Exit(code),
        (None, Some(signal)) => ProcessFailureKind::Signal(signal),
        (None, None) => ProcessFailureKind::Exit(-1),
    };
    Err(failure(config, kind, captured, status.code(), started))
}

async fn pump<R>(mut reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<(OutputStream, Vec<u8>)>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send((stream, buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(%stream, error = %e, "stopped reading process output");
                break;
            }
        }
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

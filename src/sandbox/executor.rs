//! Sandboxed execution of generated programs
//!
//! One call to [`Executor::run`] walks a request through
//! `Preparing -> Launched -> Draining | TimedOut -> Cleaning` and returns a
//! single [`ExecutionResult`]. Both output streams are drained by their own
//! reader thread; the calling thread supervises the child, the deadline and
//! the cancel token. The workspace is dropped on every path.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::boundary::IsolationBoundary;
use super::process::{kill_process_group, new_session, POLL_INTERVAL};
use super::request::ExecutionRequest;
use super::result::{elapsed_since, ExecutionResult, RunStatus};
use super::sink::{NullSink, OutputSink};
use super::workspace::Workspace;

/// How long to keep collecting output once the child is gone. Bounds the
/// wait on grandchildren that inherited the pipes.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Shared flag used to stop a run from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug)]
enum Event {
    Chunk(Stream, String),
    Closed(Stream),
}

/// Output collected so far for one run
struct Capture<'a> {
    stdout: String,
    stderr: String,
    open_streams: usize,
    sink: &'a mut dyn OutputSink,
}

impl<'a> Capture<'a> {
    fn apply(&mut self, event: Event) {
        match event {
            Event::Chunk(Stream::Stdout, text) => {
                self.sink.on_output_chunk(&text);
                self.stdout.push_str(&text);
            }
            Event::Chunk(Stream::Stderr, text) => {
                self.sink.on_error_chunk(&text);
                self.stderr.push_str(&text);
            }
            Event::Closed(_) => self.open_streams = self.open_streams.saturating_sub(1),
        }
    }

    /// Receive one event, waiting at most `timeout`
    fn pump(&mut self, events: &Receiver<Event>, timeout: Duration) {
        if self.finished() {
            // Both streams closed before the child exited
            thread::sleep(timeout);
            return;
        }
        match events.recv_timeout(timeout) {
            Ok(event) => self.apply(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.open_streams = 0,
        }
    }

    /// Keep collecting until every reader hit end-of-stream, `grace` ran out
    /// or the run is cancelled
    fn drain(&mut self, events: &Receiver<Event>, grace: Duration, cancel: &CancelToken) {
        let until = Instant::now() + grace;
        while self.open_streams > 0 {
            if cancel.is_cancelled() {
                // Keep what was already read, stop waiting for more
                while let Ok(event) = events.try_recv() {
                    self.apply(event);
                }
                break;
            }
            let now = Instant::now();
            if now >= until {
                break;
            }
            self.pump(events, (until - now).min(POLL_INTERVAL));
        }
    }

    fn finished(&self) -> bool {
        self.open_streams == 0
    }
}

/// How the supervising loop stopped
enum Stop {
    Exited(ExitStatus),
    Terminated(RunStatus),
    Lost(String),
}

/// Runs programs through an isolation boundary
#[derive(Debug)]
pub struct Executor<B> {
    boundary: B,
    workspace_root: PathBuf,
}

impl<B: IsolationBoundary> Executor<B> {
    /// Executor placing workspaces in the system temp directory
    pub fn new(boundary: B) -> Self {
        Self {
            boundary,
            workspace_root: std::env::temp_dir(),
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Run a request to completion, timeout or failure
    pub fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.run_with(request, &mut NullSink, &CancelToken::new())
    }

    /// Run a request, streaming output to `sink` and stopping early when
    /// `cancel` fires
    pub fn run_with(
        &self,
        request: &ExecutionRequest,
        sink: &mut dyn OutputSink,
        cancel: &CancelToken,
    ) -> ExecutionResult {
        let started_at = Utc::now();

        let result = match Workspace::create(&self.workspace_root, &request.source_code) {
            Ok(workspace) => {
                let result = self.execute(&workspace, request, sink, cancel, started_at);
                drop(workspace);
                result
            }
            Err(e) => {
                log::warn!("{}", e);
                ExecutionResult::failed(RunStatus::PreparationFailed, e.to_string(), started_at)
            }
        };

        log::debug!("Run finished: {}", result.status);
        sink.on_finished(&result);
        result
    }

    fn execute(
        &self,
        workspace: &Workspace,
        request: &ExecutionRequest,
        sink: &mut dyn OutputSink,
        cancel: &CancelToken,
        started_at: chrono::DateTime<Utc>,
    ) -> ExecutionResult {
        let mut cmd = self.boundary.command(workspace, request);
        cmd.stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
        new_session(&mut cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = format!(
                    "Failed to launch through {} boundary: {}",
                    self.boundary.name(),
                    e
                );
                log::warn!("{}", message);
                return ExecutionResult::failed(RunStatus::LaunchFailed, message, started_at);
            }
        };
        log::info!(
            "Launched {} (pid {}) via {}",
            workspace.id(),
            child.id(),
            self.boundary.name()
        );

        // Too large to represent means no deadline
        let deadline = Instant::now().checked_add(request.timeout());
        let (tx, events) = crossbeam_channel::unbounded();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, Stream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, Stream::Stderr, tx.clone()));
        }
        drop(tx);

        let writer = match (request.stdin.clone(), child.stdin.take()) {
            (Some(data), Some(stdin)) => Some(spawn_writer(stdin, data)),
            _ => None,
        };

        let mut capture = Capture {
            stdout: String::new(),
            stderr: String::new(),
            open_streams: readers.len(),
            sink,
        };

        let stop = self.supervise(&mut child, workspace, &mut capture, &events, cancel, deadline);

        match &stop {
            Stop::Exited(_) => {
                capture.drain(&events, DRAIN_GRACE, cancel);
                if !capture.finished() {
                    log::warn!(
                        "Output of {} still open after exit, killing leftover processes",
                        workspace.id()
                    );
                    kill_process_group(&mut child);
                    capture.drain(&events, DRAIN_GRACE, cancel);
                }
            }
            Stop::Terminated(_) | Stop::Lost(_) => {
                if let Err(e) = child.wait() {
                    log::warn!("Failed to reap {}: {}", workspace.id(), e);
                }
                capture.drain(&events, DRAIN_GRACE, cancel);
            }
        }

        if capture.finished() {
            for reader in readers {
                let _ = reader.join();
            }
        } else {
            log::warn!("Abandoning output readers of {}", workspace.id());
        }
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        let Capture { stdout, stderr, .. } = capture;
        let (status, error) = match stop {
            Stop::Exited(exit) => {
                let exit_code = exit.code();
                if let Some(message) =
                    self.boundary.launch_failure(exit_code, &stdout, &stderr)
                {
                    log::warn!("{}", message);
                    return ExecutionResult::failed(RunStatus::LaunchFailed, message, started_at);
                }
                (RunStatus::Completed { exit_code }, None)
            }
            Stop::Terminated(RunStatus::Cancelled) => {
                (RunStatus::Cancelled, Some("Execution cancelled".to_string()))
            }
            Stop::Terminated(status) => (
                status,
                Some(format!(
                    "Execution timed out after {} s",
                    request.timeout_seconds
                )),
            ),
            Stop::Lost(message) => {
                return ExecutionResult::failed(RunStatus::LaunchFailed, message, started_at);
            }
        };

        ExecutionResult {
            stdout,
            stderr,
            error,
            status,
            started_at,
            duration: elapsed_since(started_at),
        }
    }

    /// Collect output until the child exits, the deadline passes or the run
    /// is cancelled. The deadline is no longer checked once the child has
    /// exited.
    fn supervise(
        &self,
        child: &mut Child,
        workspace: &Workspace,
        capture: &mut Capture<'_>,
        events: &Receiver<Event>,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Stop {
        loop {
            capture.pump(events, POLL_INTERVAL);

            match child.try_wait() {
                Ok(Some(exit)) => {
                    log::debug!("{} exited: {}", workspace.id(), exit);
                    return Stop::Exited(exit);
                }
                Ok(None) => {}
                Err(e) => {
                    self.boundary.terminate(child, workspace);
                    return Stop::Lost(format!("Lost track of {}: {}", workspace.id(), e));
                }
            }

            let stop = if cancel.is_cancelled() {
                RunStatus::Cancelled
            } else if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                RunStatus::TimedOut
            } else {
                continue;
            };

            log::info!("Terminating {}: {}", workspace.id(), stop);
            self.boundary.terminate(child, workspace);
            return Stop::Terminated(stop);
        }
    }
}

/// Forward one stream line by line until end-of-stream
fn spawn_reader<R>(stream: R, kind: Stream, tx: Sender<Event>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line).into_owned();
                    if tx.send(Event::Chunk(kind, text)).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("{:?} reader stopped: {}", kind, e);
                    break;
                }
            }
        }
        let _ = tx.send(Event::Closed(kind));
    })
}

/// Feed stdin from its own thread so a program that never reads it cannot
/// stall the run
fn spawn_writer(mut stdin: ChildStdin, data: String) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = stdin.write_all(data.as_bytes()) {
            log::debug!("stdin closed early: {}", e);
        }
    })
}

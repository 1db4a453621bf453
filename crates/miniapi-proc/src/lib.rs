//! miniapi-proc: Cross-platform process operations adapter
//!
//! This crate provides a uniform process surface over divergent spawn,
//! signal, and wait semantics:
//!
//! - **Spawn**: [`SpawnSpec`] describes the command once; the adapter
//!   handles argument, environment, and working-directory plumbing
//! - **Signals**: the portable [`SignalKind`] set; POSIX delivery on Unix,
//!   `TerminateProcess` on Windows (where `Interrupt` is unsupported)
//! - **Wait**: blocking, polling (zero timeout), or bounded by a deadline;
//!   exit details are cached so repeated waits on a finished child are
//!   idempotent
//!
//! # Wait Semantics
//!
//! | `timeout`         | Behavior                                         |
//! |-------------------|--------------------------------------------------|
//! | `None`            | Block until exit                                 |
//! | `Some(ZERO)`      | Single non-blocking poll; `Timeout` if running    |
//! | `Some(d)`         | Poll every 10ms until exit or `d`; then `Timeout` |

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use miniapi_core::{ops, Execution, Family, MiniapiError, MiniapiResult, PlatformContext};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

/// How often bounded waits poll for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Core Types
// ============================================================================

/// Portable signal request.
///
/// `Terminate` asks politely where the platform allows it; `Kill` is
/// unconditional. `Custom` carries a raw POSIX signal number and is only
/// deliverable on Unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Terminate,
    Interrupt,
    Kill,
    Custom(i32),
}

/// Normalized exit information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitDetails {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal, when killed by one (Unix only).
    pub signal: Option<i32>,
    /// True for a zero exit code.
    pub success: bool,
}

impl ExitDetails {
    fn from_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        ExitDetails {
            code: status.code(),
            signal,
            success: status.success(),
        }
    }
}

/// Declarative description of a command to spawn.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    capture_output: bool,
}

impl SpawnSpec {
    pub fn new(program: impl Into<String>) -> Self {
        SpawnSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            capture_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Capture stdout/stderr instead of inheriting the parent's streams.
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command.stdin(Stdio::null());
        if self.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        command
    }
}

/// Captured output of a completed command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub exit: ExitDetails,
    /// Stdout decoded lossily as UTF-8.
    pub stdout: String,
    /// Stderr decoded lossily as UTF-8.
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

/// Exclusively-owned handle to a spawned child.
///
/// Bound to the backend it was spawned on; never migrated. Exit details
/// are cached after the first successful wait, so waiting on a finished
/// child again returns the same result without touching the OS.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    pid: u32,
    family: Family,
    exit: Option<ExitDetails>,
}

impl ChildHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The backend family this handle is bound to.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Cached exit details, if the child is known to have exited.
    pub fn exit_details(&self) -> Option<ExitDetails> {
        self.exit
    }

    fn poll_exit(&mut self) -> MiniapiResult<Option<ExitDetails>> {
        if let Some(exit) = self.exit {
            return Ok(Some(exit));
        }
        let status = self
            .child
            .try_wait()
            .map_err(|e| MiniapiError::from_io(e, ops::PROC_WAIT, &format!("pid {}", self.pid)))?;
        if let Some(status) = status {
            let details = ExitDetails::from_status(status);
            self.exit = Some(details);
            return Ok(Some(details));
        }
        Ok(None)
    }

    fn wait_bounded(&mut self, timeout: Option<Duration>) -> MiniapiResult<ExitDetails> {
        match timeout {
            None => {
                if let Some(exit) = self.exit {
                    return Ok(exit);
                }
                let status = self.child.wait().map_err(|e| {
                    MiniapiError::from_io(e, ops::PROC_WAIT, &format!("pid {}", self.pid))
                })?;
                let details = ExitDetails::from_status(status);
                self.exit = Some(details);
                Ok(details)
            }
            Some(limit) if limit.is_zero() => self.poll_exit()?.ok_or(MiniapiError::Timeout),
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    if let Some(exit) = self.poll_exit()? {
                        return Ok(exit);
                    }
                    if Instant::now() >= deadline {
                        return Err(MiniapiError::Timeout);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// The process operations adapter.
pub struct ProcessOps {
    ctx: Arc<PlatformContext>,
}

impl ProcessOps {
    pub fn new(ctx: Arc<PlatformContext>) -> Self {
        ProcessOps { ctx }
    }

    /// Dispatch for operations that must produce data. A configured no-op
    /// cannot fabricate a handle or a status, and no process operation
    /// has an emulation; only a native resolution proceeds.
    fn dispatch_query(&self, operation: &str) -> MiniapiResult<Execution> {
        match self.ctx.dispatch(operation)? {
            Execution::Skipped | Execution::Emulated => Err(MiniapiError::unsupported(
                operation,
                self.ctx.profile().family.as_str(),
            )),
            other => Ok(other),
        }
    }

    /// Spawn a child process.
    pub fn spawn(&self, spec: &SpawnSpec) -> MiniapiResult<ChildHandle> {
        self.dispatch_query(ops::PROC_SPAWN)?;
        debug!(program = spec.program(), "spawning child process");
        let child = spec
            .build_command()
            .spawn()
            .map_err(|e| MiniapiError::from_io(e, ops::PROC_SPAWN, spec.program()))?;
        let pid = child.id();
        Ok(ChildHandle {
            child,
            pid,
            family: self.ctx.profile().family,
            exit: None,
        })
    }

    /// Run a command to completion, capturing its output.
    ///
    /// Output is drained on dedicated threads so a chatty child never
    /// deadlocks against a full pipe. On timeout the child is killed and
    /// `Err(Timeout)` is returned.
    pub fn run(
        &self,
        spec: &SpawnSpec,
        timeout: Option<Duration>,
    ) -> MiniapiResult<CommandOutput> {
        self.dispatch_query(ops::PROC_SPAWN)?;
        self.dispatch_query(ops::PROC_WAIT)?;
        debug!(program = spec.program(), "running command to completion");

        let started = Instant::now();
        let mut child = spec
            .clone()
            .capture_output(true)
            .build_command()
            .spawn()
            .map_err(|e| MiniapiError::from_io(e, ops::PROC_SPAWN, spec.program()))?;

        let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
        let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

        let pid = child.id();
        let mut handle = ChildHandle {
            child,
            pid,
            family: self.ctx.profile().family,
            exit: None,
        };
        let exit = match handle.wait_bounded(timeout) {
            Ok(exit) => exit,
            Err(MiniapiError::Timeout) => {
                // Reap the child before reporting the timeout.
                let _ = handle.child.kill();
                let _ = handle.child.wait();
                return Err(MiniapiError::Timeout);
            }
            Err(e) => return Err(e),
        };

        Ok(CommandOutput {
            exit,
            stdout: join_pipe_reader(stdout_reader),
            stderr: join_pipe_reader(stderr_reader),
            duration: started.elapsed(),
        })
    }

    /// Wait for a child to exit.
    ///
    /// See the crate docs for the timeout table. Repeated waits on a
    /// finished child return the cached [`ExitDetails`].
    pub fn wait(
        &self,
        handle: &mut ChildHandle,
        timeout: Option<Duration>,
    ) -> MiniapiResult<ExitDetails> {
        self.dispatch_query(ops::PROC_WAIT)?;
        handle.wait_bounded(timeout)
    }

    /// Deliver a portable signal to a child.
    pub fn signal(&self, handle: &ChildHandle, kind: SignalKind) -> MiniapiResult<()> {
        self.dispatch_query(ops::PROC_SIGNAL)?;
        if handle.exit.is_some() {
            return Err(MiniapiError::not_found(format!(
                "process {}",
                handle.pid
            )));
        }
        platform::send_signal(handle.pid, kind)
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&self, handle: &mut ChildHandle) -> MiniapiResult<bool> {
        self.dispatch_query(ops::PROC_IS_ALIVE)?;
        Ok(handle.poll_exit()?.is_none())
    }

    /// Locate an executable by name on the search path.
    ///
    /// Names containing a path separator are checked directly. On Windows
    /// the conventional executable extensions are probed when the name has
    /// none.
    pub fn find_executable(&self, name: &str) -> MiniapiResult<Option<PathBuf>> {
        self.dispatch_query(ops::PROC_FIND_EXECUTABLE)?;

        if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
            let direct = PathBuf::from(name);
            return Ok(first_executable_candidate(&direct));
        }

        let Some(search_path) = std::env::var_os("PATH") else {
            return Ok(None);
        };
        for dir in std::env::split_paths(&search_path) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            if let Some(hit) = first_executable_candidate(&dir.join(name)) {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    /// True when `name` resolves to an executable on the search path.
    pub fn command_exists(&self, name: &str) -> MiniapiResult<bool> {
        Ok(self.find_executable(name)?.is_some())
    }
}

fn spawn_pipe_reader<R>(mut pipe: R) -> std::thread::JoinHandle<Vec<u8>>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_pipe_reader(reader: Option<std::thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn first_executable_candidate(path: &Path) -> Option<PathBuf> {
    platform::is_executable(path).then(|| path.to_path_buf())
}

#[cfg(windows)]
fn first_executable_candidate(path: &Path) -> Option<PathBuf> {
    if path.extension().is_some() {
        return platform::is_executable(path).then(|| path.to_path_buf());
    }
    for ext in ["exe", "bat", "cmd", "com"] {
        let candidate = path.with_extension(ext);
        if platform::is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

//! Owned child processes with bounded cancellation.
//!
//! Each builder owns at most one external child for build and one for run
//! at any time. Cancellation is explicit and bounded: a stop request asks
//! the child to terminate, waits up to a fixed timeout, and escalates to
//! a forced kill if the bound is exceeded.
//!
//! Long waits never block the caller outright: the wait loop periodically
//! yields to an injected tick callback (an external collaborator hook,
//! e.g. keeping a host event loop responsive).

use crate::error::{BuildError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Milliseconds a stop request waits before escalating to a forced kill.
pub const STOP_TIMEOUT_MS: u64 = 5000;

/// Interval between tick-callback invocations during a wait.
const TICK_INTERVAL_MS: u64 = 100;

/// Periodic yield hook invoked while a process wait is in flight.
pub type TickCallback = Box<dyn Fn() + Send + Sync>;

/// A command to run, with working directory.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Exit status plus captured output of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A spawned child process owned by one builder phase.
pub struct ManagedProcess {
    child: Child,
    program: String,
}

impl ManagedProcess {
    /// Spawn the command with piped stdout/stderr.
    pub fn spawn(spec: &CommandSpec) -> Result<Self> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let child = command.spawn().map_err(|source| BuildError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        debug!(program = %spec.program, "spawned child process");

        Ok(Self {
            child,
            program: spec.program.clone(),
        })
    }

    /// Wait for the process to exit, capturing its output.
    ///
    /// Output pipes are drained concurrently with the wait so a chatty
    /// child cannot deadlock on a full pipe. The tick callback fires
    /// roughly every 100ms while the child is still running.
    pub async fn wait(mut self, tick: Option<&TickCallback>) -> Result<ProcessOutput> {
        let mut stdout_pipe = self.child.stdout.take();
        let mut stderr_pipe = self.child.stderr.take();

        let drain = async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut stdout).await;
            }
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            (stdout, stderr)
        };

        let status = async {
            loop {
                tokio::select! {
                    status = self.child.wait() => break status,
                    () = tokio::time::sleep(Duration::from_millis(TICK_INTERVAL_MS)) => {
                        if let Some(tick) = tick {
                            tick();
                        }
                    }
                }
            }
        };

        let ((stdout, stderr), status) = tokio::join!(drain, status);
        let status = status.map_err(BuildError::ProcessWait)?;

        Ok(ProcessOutput {
            success: status.success(),
            stdout,
            stderr,
        })
    }

    /// Request termination, wait up to [`STOP_TIMEOUT_MS`], escalate to a
    /// forced kill if the bound is exceeded.
    pub async fn stop(mut self) -> Result<ProcessOutput> {
        debug!(program = %self.program, "stopping child process");
        self.child.start_kill().map_err(BuildError::ProcessWait)?;

        match tokio::time::timeout(
            Duration::from_millis(STOP_TIMEOUT_MS),
            self.child.wait(),
        )
        .await
        {
            Ok(status) => {
                let status = status.map_err(BuildError::ProcessWait)?;
                Ok(ProcessOutput {
                    success: status.success(),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
            Err(_) => {
                warn!(
                    program = %self.program,
                    "process ignored stop request for {STOP_TIMEOUT_MS}ms, killing"
                );
                self.child.kill().await.map_err(BuildError::ProcessWait)?;
                Err(BuildError::StopTimeout(STOP_TIMEOUT_MS))
            }
        }
    }

    /// Whether the child has already exited.
    pub fn try_finished(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

/// Spawn, wait, and capture in one call.
pub async fn run_command(spec: &CommandSpec, tick: Option<&TickCallback>) -> Result<ProcessOutput> {
    ManagedProcess::spawn(spec)?.wait(tick).await
}

//! Shell command execution for `command` / `not_command` checks.
//!
//! # Invariants
//! - A command never runs longer than the configured timeout; on expiry the
//!   child is killed and `CommandError::Timeout` is returned.
//! - The deadline also bounds output collection. Background processes that
//!   keep the pipes open after the shell exits are killed with its group.
//! - Captured output is truncated before it reaches reports.

use crate::error::ErrorKind;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Default bound for one command check.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_STDOUT_CHARS: usize = 5000;
const MAX_STDERR_CHARS: usize = 2000;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command execution failures.
#[derive(Debug)]
pub enum CommandError {
    /// Process could not be started or awaited.
    Spawn(std::io::Error),
    /// Process exceeded its time bound and was killed.
    Timeout { after: Duration },
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn(_) => ErrorKind::Invalid,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "{err}"),
            Self::Timeout { after } => write!(f, "Command timed out after {}s", after.as_secs()),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Timeout { .. } => None,
        }
    }
}

/// Runs one command line and reports its exit code and output.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, CommandError>;
}

/// `sh -c` runner with a polling timeout.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ShellCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            working_dir: None,
        }
    }

    /// Runs commands from `dir` instead of the process working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn timed_out(&self, started_at: Instant) -> CommandError {
        warn!(
            "event=command_run module=probe status=timeout duration_ms={}",
            started_at.elapsed().as_millis()
        );
        CommandError::Timeout {
            after: self.timeout,
        }
    }

    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        let started_at = Instant::now();
        let mut cmd = Self::shell_command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(CommandError::Spawn)?;
        // Pipes must be drained while polling; a full pipe stalls the child.
        let stdout_rx = spawn_drain(child.stdout.take());
        let stderr_rx = spawn_drain(child.stderr.take());

        let deadline = started_at + self.timeout;
        let status = loop {
            match child.try_wait().map_err(CommandError::Spawn)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    return Err(self.timed_out(started_at));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let (Some(stdout), Some(stderr)) = (
            collect_until(&stdout_rx, deadline),
            collect_until(&stderr_rx, deadline),
        ) else {
            kill_process_group(&mut child);
            return Err(self.timed_out(started_at));
        };
        let exit_code = status.code().unwrap_or(-1);
        debug!(
            "event=command_run module=probe status=ok exit_code={} duration_ms={}",
            exit_code,
            started_at.elapsed().as_millis()
        );

        Ok(CommandOutput {
            exit_code,
            stdout: truncate_chars(&stdout, MAX_STDOUT_CHARS),
            stderr: truncate_chars(&stderr, MAX_STDERR_CHARS),
        })
    }
}

fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        let _ = tx.send(String::from_utf8_lossy(&buffer).into_owned());
    });
    rx
}

/// `None` when the pipe is still open at the deadline.
fn collect_until(rx: &Receiver<String>, deadline: Instant) -> Option<String> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(output) => Some(output),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: the child was spawned as leader of its own process group.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

/// Keeps at most `max_chars` characters of `value`.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

//! External command execution.
//!
//! Every tool invocation goes through a [`CommandRunner`], which turns an
//! argument vector into an exit code and captured output. Launch failures and
//! timeouts are folded into the same [`CommandOutput`] shape so callers never
//! see an error from this layer.

pub mod container;

pub use container::{Container, PreflightError};

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported for timeouts and launch failures.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Exit code a shell reports when the requested binary does not exist.
pub const NOT_INSTALLED_EXIT_CODE: i32 = 127;

/// Upper bound on a single tool invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Exit code, stdout and stderr of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// A failed invocation with a diagnostic message on stderr.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(FAILURE_EXIT_CODE, String::new(), message)
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn not_installed(&self) -> bool {
        self.exit_code == NOT_INSTALLED_EXIT_CODE
    }
}

/// Runs an argument vector to completion.
pub trait CommandRunner {
    fn run(&self, argv: &[String]) -> impl Future<Output = CommandOutput>;
}

/// Runs commands as child processes with a wall-clock limit.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> CommandOutput {
        execute(argv, self.timeout).await
    }
}

/// Execute a command, capturing its output and killing it on timeout.
pub async fn execute(argv: &[String], timeout: Duration) -> CommandOutput {
    let Some((program, args)) = argv.split_first() else {
        return CommandOutput::failure("Empty command");
    };

    debug!("Executing: {}", argv.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            warn!(
                "Command timed out after {}s: {}",
                timeout.as_secs(),
                argv.join(" ")
            );
            CommandOutput::failure(format!(
                "Command timed out after {}s",
                timeout.as_secs()
            ))
        }
        Ok(Err(e)) => {
            warn!("Failed to execute {}: {}", program, e);
            CommandOutput::failure(format!("Failed to execute {}: {}", program, e))
        }
        Ok(Ok(output)) => {
            // No exit code means the process was killed by a signal.
            let exit_code = output.status.code().unwrap_or(-1);
            debug!("{} exited with code {}", program, exit_code);

            CommandOutput {
                exit_code,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        }
    }
}

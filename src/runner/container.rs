//! Container targeting and the preflight gate.

use super::{CommandOutput, CommandRunner};
use thiserror::Error;
use tracing::{debug, info};

/// Why the target container cannot be used.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("`{runtime} ps` failed with exit code {exit_code}: {stderr}")]
    RuntimeFailed {
        runtime: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("container '{name}' is not running (running: {})", format_running(.running))]
    NotRunning { name: String, running: Vec<String> },
}

fn format_running(running: &[String]) -> String {
    if running.is_empty() {
        "none".to_string()
    } else {
        running.join(", ")
    }
}

/// A running container that tools are executed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Runtime binary, e.g. `podman` or `docker`.
    pub runtime: String,
    /// Container name as listed by `<runtime> ps`.
    pub name: String,
    /// Working directory inside the container.
    pub workdir: Option<String>,
}

impl Container {
    pub fn new(runtime: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            name: name.into(),
            workdir: None,
        }
    }

    pub fn with_workdir(mut self, workdir: Option<String>) -> Self {
        self.workdir = workdir;
        self
    }

    /// Argument vector listing running container names, one per line.
    pub fn ps_command(&self) -> Vec<String> {
        vec![
            self.runtime.clone(),
            "ps".to_string(),
            "--format".to_string(),
            "{{.Names}}".to_string(),
        ]
    }

    /// Wrap a tool command so it runs inside the container.
    pub fn exec_command(&self, tool: &[&str]) -> Vec<String> {
        let mut argv = vec![self.runtime.clone(), "exec".to_string()];

        if let Some(ref workdir) = self.workdir {
            argv.push("-w".to_string());
            argv.push(workdir.clone());
        }

        argv.push(self.name.clone());
        argv.extend(tool.iter().map(|s| s.to_string()));
        argv
    }

    /// Verify the container is in the runtime's running set.
    pub async fn preflight<R: CommandRunner>(&self, runner: &R) -> Result<(), PreflightError> {
        info!("Checking that container '{}' is running", self.name);

        let output = runner.run(&self.ps_command()).await;
        if !output.success() {
            return Err(PreflightError::RuntimeFailed {
                runtime: self.runtime.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let running = running_containers(&output);
        debug!("Running containers: {:?}", running);

        if running.iter().any(|name| name == &self.name) {
            Ok(())
        } else {
            Err(PreflightError::NotRunning {
                name: self.name.clone(),
                running,
            })
        }
    }
}

/// Parse `ps --format {{.Names}}` output into container names.
fn running_containers(output: &CommandOutput) -> Vec<String> {
    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.qareport.toml` files.

use crate::cli::{OptionalTool, OutputFormat};
use crate::runner::DEFAULT_TIMEOUT_SECS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".qareport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Command execution settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Optional and advisory tool toggles.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Target container name.
    #[serde(default = "default_container")]
    pub container: String,

    /// Directory the report is written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

fn default_container() -> String {
    "ocserv-agent-qa".to_string()
}

fn default_output_dir() -> String {
    "docs/qa-reports".to_string()
}

/// Container runtime and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Container runtime binary.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Working directory inside the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,

    /// Per-invocation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            workdir: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_runtime() -> String {
    "podman".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of lint issues listed in the report.
    #[serde(default = "default_top_lint_issues")]
    pub top_lint_issues: usize,

    /// Maximum raw lines listed per line-oriented tool.
    #[serde(default = "default_max_tool_lines")]
    pub max_tool_lines: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_lint_issues: default_top_lint_issues(),
            max_tool_lines: default_max_tool_lines(),
        }
    }
}

fn default_top_lint_issues() -> usize {
    10
}

fn default_max_tool_lines() -> usize {
    50
}

/// Which optional tools run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub staticcheck: bool,
    #[serde(default = "default_true")]
    pub build: bool,
    #[serde(default = "default_true")]
    pub gofmt: bool,
    #[serde(default = "default_true")]
    pub gosec: bool,
    #[serde(default = "default_true")]
    pub govulncheck: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            staticcheck: true,
            build: true,
            gofmt: true,
            gosec: true,
            govulncheck: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl ToolsConfig {
    pub fn is_enabled(&self, tool: OptionalTool) -> bool {
        match tool {
            OptionalTool::Staticcheck => self.staticcheck,
            OptionalTool::Build => self.build,
            OptionalTool::Gofmt => self.gofmt,
            OptionalTool::Gosec => self.gosec,
            OptionalTool::Govulncheck => self.govulncheck,
        }
    }

    pub fn disable(&mut self, tool: OptionalTool) {
        match tool {
            OptionalTool::Staticcheck => self.staticcheck = false,
            OptionalTool::Build => self.build = false,
            OptionalTool::Gofmt => self.gofmt = false,
            OptionalTool::Gosec => self.gosec = false,
            OptionalTool::Govulncheck => self.govulncheck = false,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref container) = args.container {
            self.general.container = container.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output_dir = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref runtime) = args.runtime {
            self.runner.runtime = runtime.clone();
        }
        if let Some(ref workdir) = args.workdir {
            self.runner.workdir = Some(workdir.clone());
        }
        if let Some(timeout) = args.timeout {
            self.runner.timeout_seconds = timeout;
        }

        for tool in &args.skip {
            self.tools.disable(*tool);
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

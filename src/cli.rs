//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// qareport - containerized QA gate for Go services
///
/// Runs golangci-lint, go test (race + coverage), go vet and staticcheck
/// inside a running container, then writes a dated QA report and exits
/// non-zero when a quality gate fails.
///
/// Examples:
///   qareport
///   qareport --container ocserv-agent-qa --output docs/qa-reports
///   qareport --runtime docker --workdir /app --skip gosec,govulncheck
///   qareport --format json --verbose
///   qareport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Target container that every tool is executed in
    ///
    /// Default: ocserv-agent-qa (or `general.container` from the config file).
    #[arg(long, value_name = "NAME", env = "QAREPORT_CONTAINER")]
    pub container: Option<String>,

    /// Directory the report is written into (created if absent)
    ///
    /// Default: docs/qa-reports (or `general.output_dir` from the config file).
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .qareport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Container runtime binary
    #[arg(long, value_name = "BIN", env = "QAREPORT_RUNTIME")]
    pub runtime: Option<String>,

    /// Working directory inside the container
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Per-tool timeout in seconds
    ///
    /// Default: 600. A timed-out tool counts as failed; later tools still run.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Let golangci-lint apply automatic fixes
    #[arg(long)]
    pub fix: bool,

    /// Optional tools to skip (comma-separated)
    ///
    /// Example: --skip gosec,govulncheck
    #[arg(long, value_name = "TOOLS", value_delimiter = ',')]
    pub skip: Vec<OptionalTool>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .qareport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Tools that are not required for the verdict and may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OptionalTool {
    Staticcheck,
    Build,
    Gofmt,
    Gosec,
    Govulncheck,
}

impl OptionalTool {
    /// Name used in logs and the report.
    pub fn display_name(&self) -> &'static str {
        match self {
            OptionalTool::Staticcheck => "staticcheck",
            OptionalTool::Build => "go build",
            OptionalTool::Gofmt => "gofmt",
            OptionalTool::Gosec => "gosec",
            OptionalTool::Govulncheck => "govulncheck",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref container) = self.container {
            if container.trim().is_empty() {
                return Err("Container name must not be empty".to_string());
            }
        }

        if let Some(ref runtime) = self.runtime {
            if runtime.trim().is_empty() {
                return Err("Runtime must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref output) = self.output {
            if output.is_file() {
                return Err(format!(
                    "Output path is a file, expected a directory: {}",
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

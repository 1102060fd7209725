//! Tool orchestration.
//!
//! Runs every QA tool in sequence inside the target container and folds
//! the parsed output into a [`MetricsRecord`]. A failing or timed-out tool
//! only degrades its own contribution; the remaining tools still run.

use super::{findings, gotest, lint, MIN_COVERAGE};
use crate::cli::OptionalTool;
use crate::config::ToolsConfig;
use crate::models::{MetricsRecord, ToolFindings, ToolStatus};
use crate::runner::{CommandOutput, CommandRunner, Container, PreflightError};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

const LINT: &[&str] = &["golangci-lint", "run", "--out-format", "json", "./..."];
const TEST: &[&str] = &[
    "go",
    "test",
    "-v",
    "-race",
    "-coverprofile=coverage.out",
    "-covermode=atomic",
    "./...",
];
const COVER: &[&str] = &["go", "tool", "cover", "-func=coverage.out"];
const VET: &[&str] = &["go", "vet", "./..."];
const STATICCHECK: &[&str] = &["staticcheck", "./..."];
const BUILD: &[&str] = &["go", "build", "./..."];
const GOFMT: &[&str] = &["gofmt", "-l", "."];
const GOSEC: &[&str] = &["gosec", "-fmt=json", "-quiet", "./..."];
const GOVULNCHECK: &[&str] = &["govulncheck", "./..."];

/// Knobs for a single aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregatorOptions {
    /// Pass `--fix` to golangci-lint.
    pub fix: bool,
    /// Which optional tools run.
    pub tools: ToolsConfig,
    /// Show a spinner while a tool is running.
    pub show_progress: bool,
}

/// Runs the QA tools against one container.
pub struct QaAggregator<'a, R> {
    runner: &'a R,
    container: &'a Container,
    options: AggregatorOptions,
}

impl<'a, R: CommandRunner> QaAggregator<'a, R> {
    pub fn new(runner: &'a R, container: &'a Container, options: AggregatorOptions) -> Self {
        Self {
            runner,
            container,
            options,
        }
    }

    /// Preflight the container, then run every tool.
    ///
    /// Nothing is executed inside the container when the preflight fails.
    pub async fn run(&self) -> Result<MetricsRecord, PreflightError> {
        self.container.preflight(self.runner).await?;
        info!("Container '{}' is running", self.container.name);
        Ok(self.collect().await)
    }

    /// Run every tool in order and build the metrics record.
    pub async fn collect(&self) -> MetricsRecord {
        let mut metrics = MetricsRecord::default();

        self.run_lint(&mut metrics).await;
        self.run_tests(&mut metrics).await;
        self.run_vet(&mut metrics).await;

        metrics.staticcheck = self
            .run_optional(OptionalTool::Staticcheck, STATICCHECK, findings::staticcheck)
            .await;
        metrics.build = self
            .run_optional(OptionalTool::Build, BUILD, findings::build)
            .await;
        metrics.gofmt = self
            .run_optional(OptionalTool::Gofmt, GOFMT, findings::gofmt)
            .await;
        metrics.gosec = self
            .run_optional(OptionalTool::Gosec, GOSEC, findings::gosec)
            .await;
        metrics.govulncheck = self
            .run_optional(OptionalTool::Govulncheck, GOVULNCHECK, findings::govulncheck)
            .await;

        metrics
    }

    async fn run_lint(&self, metrics: &mut MetricsRecord) {
        self.step("🔍 Running golangci-lint...");

        let mut command = LINT.to_vec();
        if self.options.fix {
            command.push("--fix");
        }

        let output = self.invoke(&command).await;
        let summary = lint::summarize(&output);

        if summary.total() == 0 {
            info!("golangci-lint: no issues");
        } else {
            warn!(
                "golangci-lint: {} error(s), {} warning(s)",
                summary.errors, summary.warnings
            );
        }

        metrics.record_lint(summary);
    }

    async fn run_tests(&self, metrics: &mut MetricsRecord) {
        self.step("🧪 Running go test (race detector, coverage)...");

        let output = self.invoke(TEST).await;
        let summary = gotest::summarize(&output);

        if summary.failed > 0 {
            warn!(
                "Tests: {} passed, {} FAILED, {} skipped",
                summary.passed, summary.failed, summary.skipped
            );
        } else {
            info!(
                "Tests: {} run, {} passed ({} skipped)",
                summary.total(),
                summary.passed,
                summary.skipped
            );
        }
        metrics.record_tests(summary);

        self.step("📈 Collecting coverage summary...");
        let output = self.invoke(COVER).await;
        metrics.coverage_percent = gotest::coverage_percent(&output);

        if metrics.coverage_percent >= MIN_COVERAGE {
            info!("Coverage: {:.1}%", metrics.coverage_percent);
        } else {
            warn!(
                "Coverage: {:.1}% (below {:.0}%)",
                metrics.coverage_percent, MIN_COVERAGE
            );
        }
    }

    async fn run_vet(&self, metrics: &mut MetricsRecord) {
        self.step("🩺 Running go vet...");

        let output = self.invoke(VET).await;
        metrics.vet = findings::vet(&output);
        log_findings("go vet", &metrics.vet);
    }

    async fn run_optional(
        &self,
        tool: OptionalTool,
        command: &[&str],
        parse: fn(&CommandOutput) -> ToolFindings,
    ) -> ToolFindings {
        let label = tool.display_name();

        if !self.options.tools.is_enabled(tool) {
            info!("{} disabled, skipping", label);
            return ToolFindings::disabled();
        }

        self.step(&format!("🔎 Running {}...", command.join(" ")));
        let output = self.invoke(command).await;
        let findings = parse(&output);
        log_findings(label, &findings);
        findings
    }

    /// Print a step header unless progress output is off.
    fn step(&self, message: &str) {
        if self.options.show_progress {
            println!("{}", message);
        }
    }

    /// Execute a tool inside the container.
    async fn invoke(&self, tool: &[&str]) -> CommandOutput {
        let spinner = self.spinner(tool);
        let output = self.runner.run(&self.container.exec_command(tool)).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        debug!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            tool.join(" "),
            output.exit_code,
            output.stdout.len(),
            output.stderr.len()
        );
        output
    }

    fn spinner(&self, tool: &[&str]) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("   {spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(tool.join(" "));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

fn log_findings(label: &str, findings: &ToolFindings) {
    match findings.status {
        ToolStatus::Clean => info!("{}: no issues", label),
        ToolStatus::IssuesFound => warn!("{}: {} issue(s)", label, findings.issue_count),
        ToolStatus::NotInstalled => {
            warn!("{} is not installed in the container, skipped", label)
        }
        ToolStatus::Failed => warn!("{} did not complete, result unknown", label),
        ToolStatus::Disabled | ToolStatus::NotRun => debug!("{}: not run", label),
    }
}

//! Data models for the QA report.
//!
//! This module contains the metrics record that every tool step writes
//! into, the per-tool partial results, and the final report structure.

use crate::cli::OptionalTool;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a linter finding.
///
/// Only two levels exist: the linter's `"error"` severity, and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Error,
    Warning,
}

impl LintSeverity {
    /// Classify a raw severity string reported by the linter.
    ///
    /// Exactly `"error"` (case-insensitive) is an error; any other value,
    /// including an empty or missing one, is a warning.
    pub fn classify(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("error") => LintSeverity::Error,
            _ => LintSeverity::Warning,
        }
    }

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            LintSeverity::Error => "🔴",
            LintSeverity::Warning => "🟡",
        }
    }
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintSeverity::Error => write!(f, "error"),
            LintSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// A single issue reported by the linter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    /// Path of the offending file, as reported by the linter.
    pub file: String,
    /// Line number (1-indexed, 0 when the linter gave none).
    pub line: usize,
    /// Name of the linter that produced the issue.
    pub linter: String,
    /// Classified severity.
    pub severity: LintSeverity,
    /// Message text.
    pub message: String,
}

impl LintIssue {
    /// Returns the `file:line` location string.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// Outcome of the linter step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintSummary {
    pub errors: usize,
    pub warnings: usize,
    /// Issues in the linter's emission order.
    pub issues: Vec<LintIssue>,
}

impl LintSummary {
    /// Builds a summary from issues, keeping their order.
    pub fn from_issues(issues: Vec<LintIssue>) -> Self {
        let errors = issues
            .iter()
            .filter(|i| i.severity == LintSeverity::Error)
            .count();

        Self {
            errors,
            warnings: issues.len() - errors,
            issues,
        }
    }

    pub fn total(&self) -> usize {
        self.issues.len()
    }
}

/// Counts scraped from verbose test output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TestSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// How a line-oriented tool step ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// The step has not been executed.
    #[default]
    NotRun,
    /// The tool ran and reported nothing.
    Clean,
    /// The tool ran and reported at least one issue.
    IssuesFound,
    /// The tool binary is missing inside the container (exit code 127).
    NotInstalled,
    /// The step was turned off by configuration.
    Disabled,
    /// The tool exited nonzero without reporting any issue: a timeout,
    /// launch failure or crash. Its result is unknown.
    Failed,
}

impl ToolStatus {
    /// Short label used in the report tables.
    pub fn label(&self) -> &'static str {
        match self {
            ToolStatus::NotRun => "⚪ not run",
            ToolStatus::Clean => "✅ clean",
            ToolStatus::IssuesFound => "⚠️ issues",
            ToolStatus::NotInstalled => "⏭️ not installed",
            ToolStatus::Disabled => "⏭️ disabled",
            ToolStatus::Failed => "❌ failed",
        }
    }

    /// Whether the tool actually produced a result.
    pub fn ran(&self) -> bool {
        matches!(self, ToolStatus::Clean | ToolStatus::IssuesFound)
    }
}

/// Issue count and raw lines produced by a line-oriented tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolFindings {
    pub status: ToolStatus,
    pub issue_count: usize,
    /// Raw issue lines in emission order.
    pub lines: Vec<String>,
}

impl ToolFindings {
    pub fn clean() -> Self {
        Self::with_status(ToolStatus::Clean)
    }

    pub fn not_installed() -> Self {
        Self::with_status(ToolStatus::NotInstalled)
    }

    pub fn disabled() -> Self {
        Self::with_status(ToolStatus::Disabled)
    }

    pub fn failed() -> Self {
        Self::with_status(ToolStatus::Failed)
    }

    fn with_status(status: ToolStatus) -> Self {
        Self {
            status,
            issue_count: 0,
            lines: Vec::new(),
        }
    }

    /// Builds findings from issue lines; an empty list means clean.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let status = if lines.is_empty() {
            ToolStatus::Clean
        } else {
            ToolStatus::IssuesFound
        };

        Self {
            status,
            issue_count: lines.len(),
            lines,
        }
    }
}

/// Aggregate of all tool results for one report run.
///
/// Created empty, written once per tool step, then read by the verdict
/// and the report renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub linter_errors: usize,
    pub linter_warnings: usize,
    pub linter_issues: Vec<LintIssue>,

    pub tests_passed: usize,
    pub tests_failed: usize,
    pub tests_skipped: usize,
    pub coverage_percent: f64,

    pub vet: ToolFindings,
    pub staticcheck: ToolFindings,

    /// Advisory checks; they never influence the verdict.
    pub build: ToolFindings,
    pub gofmt: ToolFindings,
    pub gosec: ToolFindings,
    pub govulncheck: ToolFindings,
}

impl MetricsRecord {
    pub fn record_lint(&mut self, summary: LintSummary) {
        self.linter_errors = summary.errors;
        self.linter_warnings = summary.warnings;
        self.linter_issues = summary.issues;
    }

    pub fn record_tests(&mut self, summary: TestSummary) {
        self.tests_passed = summary.passed;
        self.tests_failed = summary.failed;
        self.tests_skipped = summary.skipped;
    }

    pub fn vet_issue_count(&self) -> usize {
        self.vet.issue_count
    }

    pub fn staticcheck_issue_count(&self) -> usize {
        self.staticcheck.issue_count
    }

    pub fn total_tests(&self) -> usize {
        self.tests_passed + self.tests_failed + self.tests_skipped
    }

    /// Advisory results paired with their display names, in run order.
    pub fn advisory_checks(&self) -> [(&'static str, &ToolFindings); 4] {
        [
            (OptionalTool::Build.display_name(), &self.build),
            (OptionalTool::Gofmt.display_name(), &self.gofmt),
            (OptionalTool::Gosec.display_name(), &self.gosec),
            (OptionalTool::Govulncheck.display_name(), &self.govulncheck),
        ]
    }
}

/// The single pass/fail outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Process exit status mirroring the verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }

    /// Markdown badge for the report header.
    pub fn badge(&self) -> &'static str {
        match self {
            Verdict::Pass => "✅ **PASS**",
            Verdict::Fail => "❌ **FAIL**",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Metadata about the report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the target container.
    pub container: String,
    /// Container runtime binary used for every invocation.
    pub runtime: String,
    /// Date and time the run started.
    pub generated_at: DateTime<Local>,
    /// Per-invocation timeout in seconds.
    pub tool_timeout_seconds: u64,
    /// Wall-clock duration of the whole run in seconds.
    pub duration_seconds: f64,
}

/// The complete QA report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub verdict: Verdict,
    pub metrics: MetricsRecord,
    /// One line per violated quality gate, in gate order.
    pub recommendations: Vec<String>,
    /// Non-gating notes from optional and advisory tools.
    pub advisories: Vec<String>,
}

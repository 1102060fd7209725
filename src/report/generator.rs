//! Markdown and JSON report generation.
//!
//! This module turns a finished [`MetricsRecord`] into a [`Report`] and
//! renders it for persistence.

use crate::analysis::{compute_verdict, violations, Gate, MIN_COVERAGE};
use crate::cli::OutputFormat;
use crate::config::ReportConfig;
use crate::models::{MetricsRecord, Report, ReportMetadata, ToolFindings, ToolStatus};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Assemble the report: verdict, gate recommendations and advisory notes.
pub fn build_report(metadata: ReportMetadata, metrics: MetricsRecord) -> Report {
    Report {
        metadata,
        verdict: compute_verdict(&metrics),
        recommendations: recommendations(&metrics),
        advisories: advisory_notes(&metrics),
        metrics,
    }
}

/// One recommendation per violated gate, in gate order.
pub fn recommendations(metrics: &MetricsRecord) -> Vec<String> {
    violations(metrics)
        .into_iter()
        .map(|gate| match gate {
            Gate::LintErrors(n) => format!(
                "Fix {} golangci-lint error(s) before merging (`golangci-lint run ./...`).",
                n
            ),
            Gate::TestFailures(n) => format!(
                "Fix {} failing test(s); rerun with `go test -race -run <Name> ./...`.",
                n
            ),
            Gate::Coverage(pct) => format!(
                "Raise test coverage from {:.1}% to at least {:.0}%.",
                pct, MIN_COVERAGE
            ),
            Gate::VetIssues(n) => format!("Resolve {} `go vet` issue(s).", n),
        })
        .collect()
}

/// Non-gating notes from staticcheck and the advisory tools.
pub fn advisory_notes(metrics: &MetricsRecord) -> Vec<String> {
    let mut notes = Vec::new();

    if metrics.vet.status == ToolStatus::Failed {
        notes.push("go vet did not complete; its result is unknown.".to_string());
    }

    match metrics.staticcheck.status {
        ToolStatus::IssuesFound => notes.push(format!(
            "Review {} staticcheck finding(s).",
            metrics.staticcheck.issue_count
        )),
        ToolStatus::NotInstalled => notes.push(
            "staticcheck is not installed in the container; install it for deeper analysis."
                .to_string(),
        ),
        ToolStatus::Failed => notes.push(failed_note("staticcheck")),
        _ => {}
    }

    for (name, findings) in metrics.advisory_checks() {
        match findings.status {
            ToolStatus::IssuesFound => {
                notes.push(format!("{}: {} finding(s) to review.", name, findings.issue_count))
            }
            ToolStatus::NotInstalled => {
                notes.push(format!("{} is not installed in the container.", name))
            }
            ToolStatus::Failed => notes.push(failed_note(name)),
            _ => {}
        }
    }

    notes
}

fn failed_note(name: &str) -> String {
    format!("{} did not complete (timeout or crash); rerun it manually.", name)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# QA Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_verdict_section(report));
    output.push_str(&generate_lint_section(&report.metrics, config.top_lint_issues));
    output.push_str(&generate_test_section(&report.metrics));
    output.push_str(&generate_findings_section(
        "go vet",
        &report.metrics.vet,
        config.max_tool_lines,
    ));
    output.push_str(&generate_findings_section(
        "staticcheck",
        &report.metrics.staticcheck,
        config.max_tool_lines,
    ));
    output.push_str(&generate_advisory_section(&report.metrics, config.max_tool_lines));
    output.push_str(&generate_recommendations_section(report));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    section.push_str(&format!("- **Container:** `{}`\n", metadata.container));
    section.push_str(&format!("- **Runtime:** `{}`\n", metadata.runtime));
    section.push_str(&format!(
        "- **Tool Timeout:** {}s\n",
        metadata.tool_timeout_seconds
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_verdict_section(report: &Report) -> String {
    let m = &report.metrics;
    let mut section = String::new();

    section.push_str("## Verdict\n\n");
    section.push_str(&format!("{}\n\n", report.verdict.badge()));

    section.push_str("| Gate | Threshold | Actual | Status |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    section.push_str(&gate_row(
        "Lint errors",
        "0",
        m.linter_errors.to_string(),
        m.linter_errors == 0,
    ));
    section.push_str(&gate_row(
        "Failed tests",
        "0",
        m.tests_failed.to_string(),
        m.tests_failed == 0,
    ));
    section.push_str(&gate_row(
        "Coverage",
        &format!("≥ {:.0}%", MIN_COVERAGE),
        format!("{:.1}%", m.coverage_percent),
        m.coverage_percent >= MIN_COVERAGE,
    ));
    section.push_str(&gate_row(
        "go vet issues",
        "0",
        m.vet_issue_count().to_string(),
        m.vet_issue_count() == 0,
    ));
    section.push('\n');

    section
}

fn gate_row(name: &str, threshold: &str, actual: String, ok: bool) -> String {
    let status = if ok { "✅" } else { "❌" };
    format!("| {} | {} | {} | {} |\n", name, threshold, actual, status)
}

fn generate_lint_section(metrics: &MetricsRecord, top: usize) -> String {
    let mut section = String::new();

    section.push_str("## Linting (golangci-lint)\n\n");
    section.push_str(&format!(
        "- **Errors:** {}\n- **Warnings:** {}\n\n",
        metrics.linter_errors, metrics.linter_warnings
    ));

    if metrics.linter_issues.is_empty() {
        section.push_str("No lint issues reported.\n\n");
        return section;
    }

    section.push_str(&format!(
        "### Top {} Issues\n\n",
        top.min(metrics.linter_issues.len())
    ));
    section.push_str("| Severity | Location | Linter | Message |\n");
    section.push_str("|:---:|:---|:---|:---|\n");

    for issue in metrics.linter_issues.iter().take(top) {
        section.push_str(&format!(
            "| {} {} | `{}` | {} | {} |\n",
            issue.severity.emoji(),
            issue.severity,
            issue.location(),
            issue.linter,
            escape_cell(&issue.message)
        ));
    }

    let remaining = metrics.linter_issues.len().saturating_sub(top);
    if remaining > 0 {
        section.push_str(&format!("\n*...and {} more.*\n", remaining));
    }
    section.push('\n');

    section
}

fn generate_test_section(metrics: &MetricsRecord) -> String {
    let mut section = String::new();

    section.push_str("## Tests\n\n");
    section.push_str("| ✅ Passed | ❌ Failed | ⏭️ Skipped | **Total** | Coverage |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** | {:.1}% |\n\n",
        metrics.tests_passed,
        metrics.tests_failed,
        metrics.tests_skipped,
        metrics.total_tests(),
        metrics.coverage_percent
    ));

    section
}

fn generate_findings_section(name: &str, findings: &ToolFindings, max_lines: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", name));
    section.push_str(&format!(
        "**Status:** {} | **Issues:** {}\n\n",
        findings.status.label(),
        findings.issue_count
    ));
    section.push_str(&findings_block(findings, max_lines));

    section
}

fn generate_advisory_section(metrics: &MetricsRecord, max_lines: usize) -> String {
    let mut section = String::new();

    section.push_str("## Advisory Checks\n\n");
    section.push_str("*These checks do not affect the verdict.*\n\n");
    section.push_str("| Check | Status | Findings |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for (name, findings) in metrics.advisory_checks() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            name,
            findings.status.label(),
            findings.issue_count
        ));
    }
    section.push('\n');

    for (name, findings) in metrics.advisory_checks() {
        if findings.lines.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", name));
        section.push_str(&findings_block(findings, max_lines));
    }

    section
}

fn findings_block(findings: &ToolFindings, max_lines: usize) -> String {
    if findings.lines.is_empty() {
        return String::new();
    }

    let mut block = String::from("```\n");
    for line in findings.lines.iter().take(max_lines) {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str("```\n");

    let remaining = findings.lines.len().saturating_sub(max_lines);
    if remaining > 0 {
        block.push_str(&format!("\n*...and {} more lines.*\n", remaining));
    }
    block.push('\n');

    block
}

fn generate_recommendations_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    if report.recommendations.is_empty() {
        section.push_str("All quality gates passed. 🎉\n\n");
    } else {
        for (i, rec) in report.recommendations.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        section.push('\n');
    }

    if !report.advisories.is_empty() {
        section.push_str("### Advisory Notes\n\n");
        for note in &report.advisories {
            section.push_str(&format!("- {}\n", note));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by qareport v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Report file name for the run's date, e.g. `qa-report-2026-10-18.md`.
pub fn report_file_name(report: &Report, format: OutputFormat) -> String {
    format!(
        "qa-report-{}.{}",
        report.metadata.generated_at.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render the report and write it into `dir`, creating the directory if needed.
pub fn save_report(
    report: &Report,
    dir: &Path,
    format: OutputFormat,
    config: &ReportConfig,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let content = match format {
        OutputFormat::Markdown => generate_markdown_report(report, config),
        OutputFormat::Json => generate_json_report(report)?,
    };

    let path = dir.join(report_file_name(report, format));
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Report written to {}", path.display());
    Ok(path)
}

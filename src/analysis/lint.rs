//! golangci-lint JSON output parsing.

use super::ParseError;
use crate::models::{LintIssue, LintSeverity, LintSummary};
use crate::runner::CommandOutput;
use serde::Deserialize;
use tracing::{debug, warn};

/// Top-level golangci-lint JSON document. `Issues` may be `null`.
#[derive(Debug, Deserialize)]
struct LintReport {
    #[serde(rename = "Issues", default)]
    issues: Option<Vec<RawIssue>>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(rename = "FromLinter", default)]
    from_linter: String,
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "Severity", default)]
    severity: Option<String>,
    #[serde(rename = "Pos", default)]
    pos: RawPosition,
}

#[derive(Debug, Default, Deserialize)]
struct RawPosition {
    #[serde(rename = "Filename", default)]
    filename: String,
    #[serde(rename = "Line", default)]
    line: usize,
}

impl From<RawIssue> for LintIssue {
    fn from(raw: RawIssue) -> Self {
        LintIssue {
            file: raw.pos.filename,
            line: raw.pos.line,
            linter: raw.from_linter,
            severity: LintSeverity::classify(raw.severity.as_deref()),
            message: raw.text,
        }
    }
}

/// Parse linter output.
///
/// A successful run with blank stdout means no issues and is not decoded.
pub fn parse(output: &CommandOutput) -> Result<LintSummary, ParseError> {
    if output.success() && output.stdout.trim().is_empty() {
        debug!("Linter succeeded with empty output");
        return Ok(LintSummary::default());
    }

    let report: LintReport =
        serde_json::from_str(&output.stdout).map_err(|source| ParseError::InvalidJson {
            tool: "golangci-lint",
            source,
        })?;

    let issues = report
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(LintIssue::from)
        .collect();

    Ok(LintSummary::from_issues(issues))
}

/// Like [`parse`], but unparsable output degrades to zero issues.
pub fn summarize(output: &CommandOutput) -> LintSummary {
    match parse(output) {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Could not parse linter output (exit code {}): {}", output.exit_code, e);
            if !output.stderr.trim().is_empty() {
                debug!("Linter stderr: {}", output.stderr.trim());
            }
            LintSummary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Issues": [
            {
                "FromLinter": "errcheck",
                "Text": "Error return value of `conn.Close` is not checked",
                "Severity": "error",
                "Pos": {"Filename": "internal/ipc/server.go", "Line": 88, "Column": 12}
            },
            {
                "FromLinter": "gocyclo",
                "Text": "cyclomatic complexity 31 of func `handle` is high (> 30)",
                "Severity": "",
                "Pos": {"Filename": "internal/ipc/handler.go", "Line": 14, "Column": 1}
            },
            {
                "FromLinter": "staticcheck",
                "Text": "SA4006: this value of `err` is never used",
                "Severity": "ERROR",
                "Pos": {"Filename": "internal/config/config.go", "Line": 203, "Column": 2}
            },
            {
                "FromLinter": "revive",
                "Text": "exported function Run should have comment or be unexported",
                "Pos": {"Filename": "cmd/agent/main.go", "Line": 21, "Column": 1}
            }
        ],
        "Report": {"Linters": []}
    }"#;

    #[test]
    fn test_parse_counts_and_order() {
        let summary = parse(&CommandOutput::new(1, SAMPLE, "")).unwrap();

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.errors + summary.warnings, summary.issues.len());

        let linters: Vec<_> = summary.issues.iter().map(|i| i.linter.as_str()).collect();
        assert_eq!(linters, vec!["errcheck", "gocyclo", "staticcheck", "revive"]);
        assert_eq!(summary.issues[0].location(), "internal/ipc/server.go:88");
        assert_eq!(summary.issues[3].severity, LintSeverity::Warning);
    }

    #[test]
    fn test_empty_stdout_on_success_skips_decode() {
        let summary = parse(&CommandOutput::new(0, "  \n", "")).unwrap();
        assert_eq!(summary, LintSummary::default());
    }

    #[test]
    fn test_empty_stdout_on_failure_is_a_parse_error() {
        let err = parse(&CommandOutput::new(2, "", "level=error msg=\"timeout\"")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { tool: "golangci-lint", .. }));
    }

    #[test]
    fn test_malformed_output_degrades_to_zero() {
        let output = CommandOutput::new(3, "panic: runtime error: index out of range", "");
        assert!(parse(&output).is_err());

        let summary = summarize(&output);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.warnings, 0);
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn test_null_issues() {
        let summary = parse(&CommandOutput::new(0, r#"{"Issues": null}"#, "")).unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_missing_position_fields() {
        let json = r#"{"Issues": [{"FromLinter": "unused", "Text": "x is unused"}]}"#;
        let summary = parse(&CommandOutput::new(1, json, "")).unwrap();

        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.issues[0].file, "");
        assert_eq!(summary.issues[0].line, 0);
    }
}

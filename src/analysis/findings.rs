//! Parsers for line-oriented checkers: go vet, staticcheck and the
//! advisory tools (go build, gofmt, gosec, govulncheck).

use super::ParseError;
use crate::models::ToolFindings;
use crate::runner::CommandOutput;
use serde::Deserialize;
use tracing::{debug, warn};

/// Non-empty lines of a stream, in order.
fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Findings from the issue lines of a finished run.
///
/// A nonzero exit that yields no lines means the tool did not complete
/// (timeout, launch failure or crash), so the result is `Failed`, not clean.
fn from_run(output: &CommandOutput, lines: Vec<String>) -> ToolFindings {
    if lines.is_empty() && !output.success() {
        debug!(
            "Exit code {} with no issue lines: {}",
            output.exit_code,
            output.stderr.trim()
        );
        return ToolFindings::failed();
    }
    ToolFindings::from_lines(lines)
}

/// `go vet`: issues are reported on stderr with a nonzero exit code.
pub fn vet(output: &CommandOutput) -> ToolFindings {
    if output.success() {
        return ToolFindings::clean();
    }
    from_run(output, non_empty_lines(&output.stderr))
}

/// `staticcheck`: issues on stdout; exit code 127 means the binary is absent.
pub fn staticcheck(output: &CommandOutput) -> ToolFindings {
    if output.not_installed() {
        return ToolFindings::not_installed();
    }
    if output.success() {
        return ToolFindings::clean();
    }
    from_run(output, non_empty_lines(&output.stdout))
}

/// `go build ./...`: compiler errors land on stderr.
pub fn build(output: &CommandOutput) -> ToolFindings {
    if output.not_installed() {
        return ToolFindings::not_installed();
    }
    if output.success() {
        return ToolFindings::clean();
    }
    from_run(output, non_empty_lines(&output.stderr))
}

/// `gofmt -l .`: every stdout line is a file needing formatting.
///
/// Listed files count regardless of the exit code; a nonzero exit with
/// nothing listed means gofmt itself failed.
pub fn gofmt(output: &CommandOutput) -> ToolFindings {
    if output.not_installed() {
        return ToolFindings::not_installed();
    }
    from_run(output, non_empty_lines(&output.stdout))
}

#[derive(Debug, Deserialize)]
struct GosecReport {
    #[serde(rename = "Issues", default)]
    issues: Option<Vec<GosecIssue>>,
}

#[derive(Debug, Deserialize)]
struct GosecIssue {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    rule_id: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    file: String,
    // gosec reports line numbers as strings, sometimes ranges ("12-14").
    #[serde(default)]
    line: String,
}

impl GosecIssue {
    fn to_line(&self) -> String {
        format!(
            "{}:{}: [{}/{}] {}",
            self.file, self.line, self.rule_id, self.severity, self.details
        )
    }
}

/// Decode gosec JSON into one line per issue.
pub fn parse_gosec(text: &str) -> Result<Vec<String>, ParseError> {
    let report: GosecReport = serde_json::from_str(text).map_err(|source| {
        ParseError::InvalidJson {
            tool: "gosec",
            source,
        }
    })?;

    Ok(report
        .issues
        .unwrap_or_default()
        .iter()
        .map(GosecIssue::to_line)
        .collect())
}

/// `gosec -fmt=json`: JSON issues, falling back to line counting when the
/// output cannot be decoded.
pub fn gosec(output: &CommandOutput) -> ToolFindings {
    if output.not_installed() {
        return ToolFindings::not_installed();
    }
    if output.success() && output.stdout.trim().is_empty() {
        return ToolFindings::clean();
    }

    match parse_gosec(&output.stdout) {
        Ok(lines) => from_run(output, lines),
        Err(e) if output.success() => {
            warn!("Ignoring undecodable gosec output: {}", e);
            ToolFindings::clean()
        }
        Err(e) => {
            debug!("Falling back to line counting for gosec: {}", e);
            from_run(output, non_empty_lines(&output.stdout))
        }
    }
}

/// `govulncheck`: one finding per `Vulnerability #N:` header.
pub fn govulncheck(output: &CommandOutput) -> ToolFindings {
    if output.not_installed() {
        return ToolFindings::not_installed();
    }

    let lines = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Vulnerability #"))
        .map(String::from)
        .collect();

    from_run(output, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolStatus;

    #[test]
    fn test_vet_clean_on_success() {
        let findings = vet(&CommandOutput::new(0, "", "# some noise\n"));
        assert_eq!(findings.status, ToolStatus::Clean);
        assert_eq!(findings.issue_count, 0);
    }

    #[test]
    fn test_vet_counts_stderr_lines() {
        let stderr = "\
# github.com/example/agent/internal/ipc
internal/ipc/server.go:41:2: unreachable code

internal/ipc/protocol.go:17:9: composite literal uses unkeyed fields
";
        let findings = vet(&CommandOutput::new(1, "ignored stdout\n", stderr));

        assert_eq!(findings.status, ToolStatus::IssuesFound);
        assert_eq!(findings.issue_count, 3);
        assert_eq!(findings.lines[1], "internal/ipc/server.go:41:2: unreachable code");
    }

    #[test]
    fn test_staticcheck_not_installed() {
        let output =
            CommandOutput::new(127, "", "exec: \"staticcheck\": executable file not found");
        let findings = staticcheck(&output);

        assert_eq!(findings.status, ToolStatus::NotInstalled);
        assert_eq!(findings.issue_count, 0);
        assert!(findings.lines.is_empty());
        assert_eq!(findings.issue_count, staticcheck(&CommandOutput::new(0, "", "")).issue_count);
    }

    #[test]
    fn test_staticcheck_counts_stdout_lines() {
        let stdout = "\
internal/cache/decisions.go:33:2: should use time.Since instead of time.Now().Sub (S1012)
internal/portal/client.go:88:6: func unusedHelper is unused (U1000)
";
        let findings = staticcheck(&CommandOutput::new(1, stdout, "ignored"));
        assert_eq!(findings.status, ToolStatus::IssuesFound);
        assert_eq!(findings.issue_count, 2);
    }

    #[test]
    fn test_build_failure_lines() {
        let stderr =
            "# github.com/example/agent/cmd/agent\ncmd/agent/main.go:12:2: undefined: foo\n";
        let findings = build(&CommandOutput::new(1, "", stderr));
        assert_eq!(findings.issue_count, 2);
        assert_eq!(build(&CommandOutput::new(0, "", "")).status, ToolStatus::Clean);
    }

    #[test]
    fn test_gofmt_ignores_exit_code() {
        let findings = gofmt(&CommandOutput::new(0, "internal/config/routes.go\n", ""));
        assert_eq!(findings.status, ToolStatus::IssuesFound);
        assert_eq!(findings.lines, vec!["internal/config/routes.go"]);

        assert_eq!(gofmt(&CommandOutput::new(127, "", "")).status, ToolStatus::NotInstalled);
    }

    #[test]
    fn test_gosec_json() {
        let stdout = r#"{
            "Golang errors": {},
            "Issues": [
                {
                    "severity": "HIGH",
                    "confidence": "HIGH",
                    "rule_id": "G204",
                    "details": "Subprocess launched with variable",
                    "file": "/app/internal/ocserv/occtl.go",
                    "code": "exec.CommandContext(ctx, name, args...)",
                    "line": "57",
                    "column": "9"
                }
            ],
            "Stats": {"files": 40, "lines": 9000, "nosec": 0, "found": 1}
        }"#;
        let findings = gosec(&CommandOutput::new(1, stdout, ""));

        assert_eq!(findings.issue_count, 1);
        assert_eq!(
            findings.lines[0],
            "/app/internal/ocserv/occtl.go:57: [G204/HIGH] Subprocess launched with variable"
        );
    }

    #[test]
    fn test_gosec_fallback_to_lines() {
        let findings = gosec(&CommandOutput::new(1, "[gosec] error\nsecond line\n", ""));
        assert_eq!(findings.issue_count, 2);
    }

    #[test]
    fn test_gosec_null_issues_is_clean() {
        let findings = gosec(&CommandOutput::new(0, r#"{"Issues": null, "Stats": {}}"#, ""));
        assert_eq!(findings.status, ToolStatus::Clean);
    }

    #[test]
    fn test_govulncheck_counts_headers() {
        let stdout = "\
Scanning your code and 212 packages across 18 dependent modules for known vulnerabilities...

Vulnerability #1: GO-2024-2687
    HTTP/2 CONTINUATION flood in net/http
  More info: https://pkg.go.dev/vuln/GO-2024-2687

Vulnerability #2: GO-2024-2611
    Infinite loop in JSON unmarshaling in google.golang.org/protobuf

Your code is affected by 2 vulnerabilities from 2 modules.
";
        let findings = govulncheck(&CommandOutput::new(3, stdout, ""));
        assert_eq!(findings.issue_count, 2);
        assert_eq!(findings.lines[0], "Vulnerability #1: GO-2024-2687");

        let clean = govulncheck(&CommandOutput::new(0, "No vulnerabilities found.\n", ""));
        assert_eq!(clean.status, ToolStatus::Clean);
    }

    #[test]
    fn test_timeout_is_failed_not_clean() {
        let timed_out = CommandOutput::failure("Command timed out after 600s");

        for findings in [staticcheck(&timed_out), gosec(&timed_out), gofmt(&timed_out)] {
            assert_eq!(findings.status, ToolStatus::Failed);
            assert_eq!(findings.issue_count, 0);
        }
    }

    #[test]
    fn test_nonzero_exit_without_issue_lines_is_failed() {
        let crashed = CommandOutput::new(1, "", "loading packages: err");
        assert_eq!(govulncheck(&crashed).status, ToolStatus::Failed);
        assert_eq!(govulncheck(&crashed).issue_count, 0);

        let silent = CommandOutput::new(2, "", "");
        assert_eq!(vet(&silent).status, ToolStatus::Failed);
        assert_eq!(build(&silent).status, ToolStatus::Failed);

        let no_issues = CommandOutput::new(1, r#"{"Issues": [], "Golang errors": {"x": []}}"#, "");
        assert_eq!(gosec(&no_issues).status, ToolStatus::Failed);
    }
}

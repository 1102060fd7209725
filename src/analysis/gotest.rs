//! `go test -v` and `go tool cover` output scraping.

use super::ParseError;
use crate::models::TestSummary;
use crate::runner::CommandOutput;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static PASS_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"--- PASS:").expect("valid regex"));
static FAIL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"--- FAIL:").expect("valid regex"));
static SKIP_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"--- SKIP:").expect("valid regex"));

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid regex"));

/// Count pass/fail/skip markers anywhere in verbose test output.
///
/// Subtests are counted like top-level tests; nesting is not interpreted.
pub fn count_tests(text: &str) -> TestSummary {
    TestSummary {
        passed: PASS_MARKER.find_iter(text).count(),
        failed: FAIL_MARKER.find_iter(text).count(),
        skipped: SKIP_MARKER.find_iter(text).count(),
    }
}

/// Counts from a test run; markers are read from stdout and stderr alike.
pub fn summarize(output: &CommandOutput) -> TestSummary {
    let mut summary = count_tests(&output.stdout);
    let from_stderr = count_tests(&output.stderr);

    summary.passed += from_stderr.passed;
    summary.failed += from_stderr.failed;
    summary.skipped += from_stderr.skipped;
    summary
}

/// Extract total coverage from `go tool cover -func` output.
///
/// Only the last non-empty line is inspected, where the tool prints
/// `total: (statements) NN.N%`.
pub fn extract_coverage(text: &str) -> Result<f64, ParseError> {
    let last_line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or(ParseError::CoverageMissing)?;

    let value: f64 = PERCENTAGE
        .captures(last_line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(ParseError::CoverageMissing)?;

    if !(0.0..=100.0).contains(&value) {
        return Err(ParseError::CoverageOutOfRange(value));
    }

    Ok(value)
}

/// Coverage percentage from the coverage summary step, `0.0` if absent.
pub fn coverage_percent(output: &CommandOutput) -> f64 {
    match extract_coverage(&output.stdout) {
        Ok(value) => value,
        Err(e) => {
            warn!("Coverage unavailable (exit code {}): {}", output.exit_code, e);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERBOSE_RUN: &str = "\
=== RUN   TestA
--- PASS: TestA (0.00s)
=== RUN   TestA
--- PASS: TestA (0.01s)
=== RUN   TestB
    handlers_test.go:42: expected 200, got 500
--- FAIL: TestB (0.02s)
FAIL
FAIL\tgithub.com/example/ocserv-agent/internal/grpc\t0.412s
";

    #[test]
    fn test_count_tests() {
        let summary = count_tests(VERBOSE_RUN);
        assert_eq!(
            summary,
            TestSummary {
                passed: 2,
                failed: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_count_subtests_and_skips() {
        let text = "\
--- PASS: TestCache (0.00s)
    --- PASS: TestCache/hit (0.00s)
    --- SKIP: TestCache/redis (0.00s)
--- SKIP: TestIntegration (0.00s)
";
        let summary = count_tests(text);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_plain_fail_line_is_not_a_marker() {
        let summary = count_tests("FAIL\nok  \tpkg\t0.1s\nPASS\n");
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_summarize_reads_both_streams() {
        let output =
            CommandOutput::new(1, "--- PASS: TestA (0.00s)\n", "--- FAIL: TestB (0.00s)\n");
        let summary = summarize(&output);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_extract_coverage_single_line() {
        assert_eq!(extract_coverage("total: (statements) 82.5%").unwrap(), 82.5);
    }

    #[test]
    fn test_extract_coverage_uses_last_non_empty_line() {
        let text = "\
github.com/example/agent/internal/cache/decisions.go:21:\tGet\t100.0%
github.com/example/agent/internal/cache/decisions.go:40:\tSet\t66.7%
total:\t\t\t\t\t\t(statements)\t71.3%


";
        assert_eq!(extract_coverage(text).unwrap(), 71.3);
    }

    #[test]
    fn test_extract_coverage_integer_percentage() {
        assert_eq!(extract_coverage("total: (statements) 100%").unwrap(), 100.0);
    }

    #[test]
    fn test_extract_coverage_missing() {
        assert!(matches!(
            extract_coverage("open coverage.out: no such file or directory"),
            Err(ParseError::CoverageMissing)
        ));
        assert!(matches!(extract_coverage(""), Err(ParseError::CoverageMissing)));
    }

    #[test]
    fn test_percentage_only_on_earlier_line_is_ignored() {
        let text = "pkg/a.go:1:\tF\t90.0%\nsomething went wrong\n";
        assert!(extract_coverage(text).is_err());
    }

    #[test]
    fn test_coverage_out_of_range() {
        assert!(matches!(
            extract_coverage("total: (statements) 180.0%"),
            Err(ParseError::CoverageOutOfRange(_))
        ));
    }

    #[test]
    fn test_coverage_percent_defaults_to_zero() {
        let output = CommandOutput::new(1, "", "go: no such tool \"cover\"");
        assert_eq!(coverage_percent(&output), 0.0);

        let output = CommandOutput::new(0, "total: (statements) 80.0%\n", "");
        assert_eq!(coverage_percent(&output), 80.0);
    }
}

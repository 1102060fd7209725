//! Quality gates and the pass/fail verdict.

use crate::models::{MetricsRecord, Verdict};
use std::fmt;

/// Minimum total coverage, in percent, required to pass.
pub const MIN_COVERAGE: f64 = 80.0;

/// A violated quality gate and the value that violated it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    LintErrors(usize),
    TestFailures(usize),
    Coverage(f64),
    VetIssues(usize),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::LintErrors(n) => write!(f, "{} lint error(s)", n),
            Gate::TestFailures(n) => write!(f, "{} failing test(s)", n),
            Gate::Coverage(pct) => write!(f, "coverage {:.1}% < {:.1}%", pct, MIN_COVERAGE),
            Gate::VetIssues(n) => write!(f, "{} go vet issue(s)", n),
        }
    }
}

/// Gates violated by `metrics`, always in the order lint, tests,
/// coverage, vet. staticcheck and advisory tools are not gates.
pub fn violations(metrics: &MetricsRecord) -> Vec<Gate> {
    let mut gates = Vec::new();

    if metrics.linter_errors > 0 {
        gates.push(Gate::LintErrors(metrics.linter_errors));
    }
    if metrics.tests_failed > 0 {
        gates.push(Gate::TestFailures(metrics.tests_failed));
    }
    if metrics.coverage_percent < MIN_COVERAGE {
        gates.push(Gate::Coverage(metrics.coverage_percent));
    }
    if metrics.vet_issue_count() > 0 {
        gates.push(Gate::VetIssues(metrics.vet_issue_count()));
    }

    gates
}

/// PASS iff no gate is violated.
pub fn compute_verdict(metrics: &MetricsRecord) -> Verdict {
    if violations(metrics).is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolFindings;

    fn passing() -> MetricsRecord {
        MetricsRecord {
            linter_errors: 0,
            tests_failed: 0,
            coverage_percent: 80.0,
            vet: ToolFindings::clean(),
            ..MetricsRecord::default()
        }
    }

    fn vet_lines(n: usize) -> ToolFindings {
        ToolFindings::from_lines((0..n).map(|i| format!("x.go:{}: issue", i)).collect())
    }

    #[test]
    fn test_boundary_passes() {
        assert_eq!(compute_verdict(&passing()), Verdict::Pass);
        assert!(violations(&passing()).is_empty());
    }

    #[test]
    fn test_each_gate_flips_verdict() {
        let mut m = passing();
        m.linter_errors = 1;
        assert_eq!(compute_verdict(&m), Verdict::Fail);

        let mut m = passing();
        m.tests_failed = 1;
        assert_eq!(compute_verdict(&m), Verdict::Fail);

        let mut m = passing();
        m.coverage_percent = 79.9;
        assert_eq!(compute_verdict(&m), Verdict::Fail);

        let mut m = passing();
        m.vet = vet_lines(1);
        assert_eq!(compute_verdict(&m), Verdict::Fail);
    }

    #[test]
    fn test_warnings_and_staticcheck_do_not_gate() {
        let mut m = passing();
        m.linter_warnings = 25;
        m.staticcheck = ToolFindings::from_lines(vec!["a.go:1: S1000".to_string(); 50]);
        m.gosec = ToolFindings::from_lines(vec!["G101".to_string()]);
        m.tests_skipped = 3;
        assert_eq!(compute_verdict(&m), Verdict::Pass);
    }

    #[test]
    fn test_violation_order_is_fixed() {
        let m = MetricsRecord {
            linter_errors: 2,
            tests_failed: 1,
            coverage_percent: 12.5,
            vet: vet_lines(4),
            ..MetricsRecord::default()
        };

        assert_eq!(
            violations(&m),
            vec![
                Gate::LintErrors(2),
                Gate::TestFailures(1),
                Gate::Coverage(12.5),
                Gate::VetIssues(4),
            ]
        );
    }

    #[test]
    fn test_empty_record_fails_on_coverage_only() {
        assert_eq!(violations(&MetricsRecord::default()), vec![Gate::Coverage(0.0)]);
    }

    #[test]
    fn test_gate_display() {
        assert_eq!(Gate::Coverage(79.94).to_string(), "coverage 79.9% < 80.0%");
        assert_eq!(Gate::VetIssues(3).to_string(), "3 go vet issue(s)");
    }
}

//! Tool output normalization and verdict computation.
//!
//! Each tool has its own parser turning a [`CommandOutput`] into a partial
//! metrics value; the aggregator runs the tools and stitches the results
//! into a [`MetricsRecord`](crate::models::MetricsRecord).
//!
//! [`CommandOutput`]: crate::runner::CommandOutput

pub mod aggregator;
pub mod findings;
pub mod gotest;
pub mod lint;
pub mod verdict;

pub use aggregator::{AggregatorOptions, QaAggregator};
pub use verdict::{compute_verdict, violations, Gate, MIN_COVERAGE};

use thiserror::Error;

/// A tool produced output that could not be interpreted.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{tool} output is not valid JSON: {source}")]
    InvalidJson {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no percentage found in coverage summary")]
    CoverageMissing,

    #[error("coverage value {0}% is outside 0-100")]
    CoverageOutOfRange(f64),
}

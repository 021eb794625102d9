//! Performance report generation.

use super::{LatencySummary, Metrics};
use std::fmt;

/// Titled, human-readable rendering of a [`Metrics`] run.
pub struct PerformanceReport {
    title: String,
    metrics: Metrics,
}

impl PerformanceReport {
    /// Creates a report titled `title`.
    #[must_use]
    pub fn new(title: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            title: title.into(),
            metrics,
        }
    }

    /// Returns the metrics being reported.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, label: &str, summary: Option<LatencySummary>) -> fmt::Result {
    let Some(summary) = summary else {
        return writeln!(f, "{label} wait (ns): no samples");
    };

    writeln!(f, "{label} wait (ns), {} samples:", summary.samples)?;
    writeln!(f, "  Min: {}", summary.min)?;
    writeln!(f, "  Mean: {:.0}", summary.mean)?;
    writeln!(f, "  Median: {}", summary.median)?;
    writeln!(f, "  P95: {}", summary.p95)?;
    writeln!(f, "  P99: {}", summary.p99)?;
    writeln!(f, "  Max: {}", summary.max)
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.title)?;
        writeln!(f, "Operations: {}", self.metrics.operations)?;
        writeln!(f, "Duration: {:?}", self.metrics.duration)?;
        writeln!(f, "Throughput: {:.2} ops/sec", self.metrics.throughput)?;
        write_summary(f, "Reader", self.metrics.read_summary())?;
        write_summary(f, "Writer", self.metrics.write_summary())
    }
}

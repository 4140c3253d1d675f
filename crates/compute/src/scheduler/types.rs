use std::time::Duration;

use serde::Serialize;

use crate::analyzer::AnalyzerOutput;

/// Outcome counters of one orchestrator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Analyzers handed to the pool (or run inline).
    pub dispatched: usize,
    /// Analyzers whose results were merged.
    pub completed: usize,
    /// Merged analyzers that produced at least one outlier or inlier.
    pub active: usize,
    /// Whether the deadline expired before every analyzer reported.
    pub timed_out: bool,
}

impl RunSummary {
    /// True when every dispatched analyzer was merged.
    pub fn is_complete(&self) -> bool {
        self.completed == self.dispatched && !self.timed_out
    }
}

/// Result of executing one analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerReport {
    /// Registration index, used to merge in a stable order.
    pub index: usize,
    pub analyzer: String,
    pub output: AnalyzerOutput,
    /// How long the analyzer took.
    pub duration: Duration,
}

impl AnalyzerReport {
    pub fn is_active(&self) -> bool {
        !self.output.is_empty()
    }
}

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use tsod_core::{Concurrency, DetectorConfig, Inlier, Outlier};

use crate::analyzer::Analyzer;
use crate::scheduler::metrics::RunMetrics;
use crate::scheduler::types::RunSummary;

/// Runs registered analyzers over a series set and accumulates their findings.
///
/// Results of the latest [`run`](Orchestrator::run) stay readable until the
/// next run starts.
pub struct Orchestrator {
    pub(super) concurrency: Concurrency,
    /// Global time budget for a parallel run.
    pub(super) deadline: Duration,
    pub(super) analyzers: Vec<Arc<dyn Analyzer>>,
    pub(super) outliers: Vec<Outlier>,
    pub(super) inliers: Vec<Inlier>,
    pub(super) summary: RunSummary,
    pub(super) metrics: RunMetrics,
}

impl Orchestrator {
    pub fn new(concurrency: Concurrency, deadline: Duration) -> Self {
        Self {
            concurrency,
            deadline,
            analyzers: Vec::new(),
            outliers: Vec::new(),
            inliers: Vec::new(),
            summary: RunSummary::default(),
            metrics: RunMetrics::default(),
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.concurrency, Duration::from_secs(config.deadline_secs))
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Register an analyzer to run on every subsequent [`run`](Orchestrator::run).
    pub fn register_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) {
        info!(
            "Registered analyzer: {} (outlier weight {}, inlier weight {})",
            analyzer.name(),
            analyzer.outlier_weight(),
            analyzer.inlier_weight()
        );
        self.analyzers.push(analyzer);
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Outliers merged during the latest run.
    pub fn outliers(&self) -> &[Outlier] {
        &self.outliers
    }

    /// Inliers merged during the latest run.
    pub fn inliers(&self) -> &[Inlier] {
        &self.inliers
    }

    /// Number of analyzers that produced at least one verdict in the latest run.
    pub fn active_analyzers(&self) -> usize {
        self.summary.active
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub(super) fn reset(&mut self) {
        self.outliers.clear();
        self.inliers.clear();
        self.summary = RunSummary::default();
        self.metrics.incomplete.clear();
        self.metrics.started_at = None;
        self.metrics.finished_at = None;
    }
}

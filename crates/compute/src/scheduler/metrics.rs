use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-analyzer execution counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyzerMetrics {
    /// Times the analyzer has been merged.
    pub runs: u64,
    /// Rolling average duration across runs.
    pub avg_duration: Duration,
    pub last_duration: Duration,
    pub outliers: usize,
    pub inliers: usize,
    /// Whether the latest run produced any verdict.
    pub active: bool,
    pub last_run: Option<DateTime<Utc>>,
}

/// Orchestrator operational metrics, included in detection reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub analyzers: BTreeMap<String, AnalyzerMetrics>,
    /// Analyzers abandoned at the deadline or lost to a panic, by name.
    pub incomplete: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunMetrics {
    /// Record an analyzer execution.
    pub fn record_execution(&mut self, analyzer: &str, duration: Duration, outliers: usize, inliers: usize) {
        let entry = self.analyzers.entry(analyzer.to_string()).or_default();
        entry.runs += 1;
        entry.last_duration = duration;
        entry.outliers = outliers;
        entry.inliers = inliers;
        entry.active = outliers + inliers > 0;
        entry.last_run = Some(Utc::now());

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        entry.avg_duration = if entry.runs == 1 {
            duration
        } else {
            let prev_nanos = entry.avg_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / entry.runs as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    /// Wall-clock time of the latest run, if it finished.
    pub fn elapsed(&self) -> Option<Duration> {
        let (start, end) = (self.started_at?, self.finished_at?);
        (end - start).to_std().ok()
    }
}

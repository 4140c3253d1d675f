use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use tsod_core::{Outlier, SeriesSet};

use crate::analyzer::{AnalysisContext, Analyzer};
use crate::scheduler::types::AnalyzerReport;

use super::Orchestrator;

fn execute(index: usize, analyzer: &dyn Analyzer, ctx: &AnalysisContext, series: &SeriesSet) -> AnalyzerReport {
    let start = Instant::now();
    let output = analyzer.analyze(ctx, series);
    AnalyzerReport {
        index,
        analyzer: analyzer.name().to_string(),
        output,
        duration: start.elapsed(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Orchestrator {
    /// Run every registered analyzer over `series` and merge the results.
    ///
    /// Clears the findings of any previous run first. In parallel mode the
    /// call returns once all analyzers have reported or the deadline has
    /// expired, whichever comes first.
    pub fn run(&mut self, ctx: Arc<AnalysisContext>, series: Arc<SeriesSet>) -> &[Outlier] {
        self.reset();
        self.metrics.started_at = Some(Utc::now());
        let dispatched = self.analyzers.len();
        info!(
            run = %ctx.run_id,
            "Starting analysis of {} series with {} analyzers ({:?})",
            series.len(),
            dispatched,
            self.concurrency
        );

        let (mut reports, timed_out) = match self.concurrency.pool_size(dispatched) {
            Some(threads) => match self.dispatch_parallel(threads, &ctx, &series) {
                Ok(collected) => collected,
                Err(e) => {
                    warn!("Failed to build analyzer pool ({}), running sequentially", e);
                    (self.dispatch_sequential(&ctx, &series), false)
                }
            },
            None => (self.dispatch_sequential(&ctx, &series), false),
        };
        reports.sort_by_key(|r| r.index);

        self.summary.dispatched = dispatched;
        self.summary.timed_out = timed_out;
        let mut merged = vec![false; dispatched];
        for report in reports {
            merged[report.index] = true;
            self.merge(report);
        }
        self.metrics.incomplete = self
            .analyzers
            .iter()
            .zip(&merged)
            .filter(|&(_, &done)| !done)
            .map(|(a, _)| a.name().to_string())
            .collect();
        self.metrics.finished_at = Some(Utc::now());

        if !self.summary.is_complete() {
            warn!(
                run = %ctx.run_id,
                timed_out,
                missing = ?self.metrics.incomplete,
                "Incomplete run: {} of {} analyzers reported",
                self.summary.completed,
                dispatched
            );
        }
        if self.summary.active < 1 {
            error!(run = %ctx.run_id, "No active analyzers: no analyzer produced a verdict");
        }
        info!(
            run = %ctx.run_id,
            "Analysis done: {} active analyzers, {} outliers, {} inliers",
            self.summary.active,
            self.outliers.len(),
            self.inliers.len()
        );

        &self.outliers
    }

    fn dispatch_parallel(
        &self,
        threads: usize,
        ctx: &Arc<AnalysisContext>,
        series: &Arc<SeriesSet>,
    ) -> Result<(Vec<AnalyzerReport>, bool), rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tsod-analyzer-{}", i))
            .panic_handler(|payload| {
                error!("Analyzer panicked: {}", panic_message(&*payload));
            })
            .build()?;
        debug!("Analyzer pool started with {} threads", threads);

        let (tx, rx) = mpsc::channel();
        for (index, analyzer) in self.analyzers.iter().enumerate() {
            let analyzer = Arc::clone(analyzer);
            let ctx = Arc::clone(ctx);
            let series = Arc::clone(series);
            let tx = tx.clone();

            pool.spawn(move || {
                let report = execute(index, analyzer.as_ref(), &ctx, &series);
                debug!("Analyzer {} finished in {:?}", report.analyzer, report.duration);
                // The receiver is gone once the deadline has passed.
                let _ = tx.send(report);
            });
        }
        drop(tx);

        let deadline = Instant::now().checked_add(self.deadline);
        let mut reports = Vec::with_capacity(self.analyzers.len());
        let mut timed_out = false;
        while reports.len() < self.analyzers.len() {
            let received = match deadline {
                Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(report) => reports.push(report),
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                // Every remaining worker dropped its sender without reporting.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok((reports, timed_out))
    }

    fn dispatch_sequential(&self, ctx: &AnalysisContext, series: &SeriesSet) -> Vec<AnalyzerReport> {
        self.analyzers
            .iter()
            .enumerate()
            .filter_map(|(index, analyzer)| {
                match panic::catch_unwind(AssertUnwindSafe(|| execute(index, analyzer.as_ref(), ctx, series))) {
                    Ok(report) => Some(report),
                    Err(payload) => {
                        error!("Analyzer {} panicked: {}", analyzer.name(), panic_message(&*payload));
                        None
                    }
                }
            })
            .collect()
    }

    /// Fold one analyzer's output into the run state. Only ever called from
    /// the coordinating thread.
    fn merge(&mut self, report: AnalyzerReport) {
        let active = report.is_active();
        let AnalyzerReport {
            analyzer,
            output,
            duration,
            ..
        } = report;
        self.metrics
            .record_execution(&analyzer, duration, output.outliers.len(), output.inliers.len());
        self.summary.completed += 1;
        if active {
            self.summary.active += 1;
        } else {
            info!("Analyzer {} abstained on every series", analyzer);
        }
        debug!(
            "Merged {}: {} outliers, {} inliers in {:?}",
            analyzer,
            output.outliers.len(),
            output.inliers.len(),
            duration
        );
        self.outliers.extend(output.outliers);
        self.inliers.extend(output.inliers);
    }
}

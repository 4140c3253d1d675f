use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use tsod_core::sample::bucket;
use tsod_core::{DataLoader, DetectorConfig, Result, SeriesSet, TrainStats, ValidatedOutlier};

use crate::analyzer::{
    AnalysisContext, Analyzer, MovingAverageAnalyzer, RandomWalkAnalyzer, TrendRegressionAnalyzer,
};
use crate::consensus::{ConsensusValidator, Validation};
use crate::pipeline::{self, PreparedData};
use crate::scheduler::{Orchestrator, RunMetrics, RunSummary};

/// The built-in analyzer set for a configuration.
pub fn default_analyzers(config: &DetectorConfig) -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(TrendRegressionAnalyzer::new(config.polynomial_degree)),
        Arc::new(RandomWalkAnalyzer::default()),
        Arc::new(MovingAverageAnalyzer::new(config.moving_average_window)),
    ]
}

/// Bucket expected-error timestamps at `resolution`, dropping duplicates
/// while keeping first-seen order.
pub fn bucket_expected(expected: &[i64], resolution: i64) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(expected.len());
    for &ts in expected {
        let b = bucket(ts, resolution);
        if !out.contains(&b) {
            out.push(b);
        }
    }
    out
}

/// Shape of one prepared series, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub name: String,
    pub points: usize,
    pub train_points: usize,
    pub classify_points: usize,
    pub sanitized: usize,
    pub stats: Option<TrainStats>,
}

/// Serializable result of a detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub run_id: Uuid,
    pub name: String,
    pub resolution: i64,
    pub min_score: f64,
    pub series: Vec<SeriesSummary>,
    pub summary: RunSummary,
    pub metrics: RunMetrics,
    pub outliers: Vec<ValidatedOutlier>,
    pub missed_expected: Vec<i64>,
    pub unexpected: Vec<i64>,
    pub generated_at: DateTime<Utc>,
}

/// Prepared data, its analyzers and the results of the latest run.
pub struct DetectionEngine {
    config: DetectorConfig,
    context: Arc<AnalysisContext>,
    series: Arc<SeriesSet>,
    expected_errors: Vec<i64>,
    orchestrator: Orchestrator,
    validation: Option<Validation>,
}

impl DetectionEngine {
    /// Load settings, samples and expected errors from `loader` and prepare them.
    ///
    /// Loader settings are overlaid on `config`.
    pub fn load(loader: &dyn DataLoader, config: DetectorConfig) -> Result<Self> {
        let config = config.with_settings(&loader.load_settings()?)?;
        Self::load_with_config(loader, config)
    }

    /// Like [`load`](Self::load) but uses `config` as-is, ignoring loader settings.
    pub fn load_with_config(loader: &dyn DataLoader, config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        config.log_summary();

        let start = Instant::now();
        let raw = loader.load_raw_samples()?;
        info!("Loaded {} raw series", raw.len());
        let prepared = pipeline::prepare(&raw, &config)?;
        info!(
            "Preparation done in {:.3}s: {} series at {}s resolution",
            start.elapsed().as_secs_f64(),
            prepared.series.len(),
            prepared.resolution
        );

        let expected = bucket_expected(&loader.load_expected_errors()?, prepared.resolution);
        Ok(Self::from_parts(config, prepared, expected))
    }

    /// Assemble an engine from already prepared data. Expected errors must
    /// already be bucketed at the prepared resolution.
    pub fn from_parts(config: DetectorConfig, prepared: PreparedData, expected_errors: Vec<i64>) -> Self {
        let context = Arc::new(AnalysisContext::new(config.name.clone(), prepared.resolution));
        let orchestrator = Orchestrator::from_config(&config);
        Self {
            config,
            context,
            series: Arc::new(prepared.series),
            expected_errors,
            orchestrator,
            validation: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn expected_errors(&self) -> &[i64] {
        &self.expected_errors
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn register_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.orchestrator.register_analyzer(analyzer);
    }

    pub fn register_default_analyzers(&mut self) {
        for analyzer in default_analyzers(&self.config) {
            self.orchestrator.register_analyzer(analyzer);
        }
    }

    /// Run every registered analyzer. Returns the number of raw outliers.
    pub fn analyze(&mut self) -> usize {
        self.validation = None;
        let start = Instant::now();
        let count = self
            .orchestrator
            .run(Arc::clone(&self.context), Arc::clone(&self.series))
            .len();
        info!("Analyzers done in {:.3}s", start.elapsed().as_secs_f64());
        count
    }

    /// Consensus-validate the latest run at the configured minimum score.
    pub fn validate(&mut self) -> &Validation {
        self.validate_with(self.config.min_score)
    }

    pub fn validate_with(&mut self, min_score: f64) -> &Validation {
        let validation = ConsensusValidator::new(
            self.orchestrator.outliers(),
            self.orchestrator.inliers(),
            &self.series,
        )
        .with_snapshot_points(self.config.snapshot_points)
        .validate_against(min_score, &self.expected_errors);
        self.validation.insert(validation)
    }

    /// Snapshot of the latest run. Outlier lists are empty until validated.
    pub fn report(&self) -> DetectionReport {
        let validation = self.validation.clone().unwrap_or_default();
        DetectionReport {
            run_id: self.context.run_id,
            name: self.config.name.clone(),
            resolution: self.context.resolution,
            min_score: self.config.min_score,
            series: self
                .series
                .values()
                .map(|s| SeriesSummary {
                    name: s.name().to_string(),
                    points: s.len(),
                    train_points: s.train_len(),
                    classify_points: s.classify_len(),
                    sanitized: s.replaced_count(),
                    stats: s.stats().copied(),
                })
                .collect(),
            summary: self.orchestrator.summary(),
            metrics: self.orchestrator.metrics().clone(),
            outliers: validation.outliers,
            missed_expected: validation.cross_check.missed,
            unexpected: validation.cross_check.unexpected,
            generated_at: Utc::now(),
        }
    }

    /// Load, analyze with the default analyzers and validate in one call.
    pub fn run(loader: &dyn DataLoader, config: DetectorConfig) -> Result<DetectionReport> {
        let mut engine = Self::load(loader, config)?;
        engine.register_default_analyzers();
        engine.analyze();
        engine.validate();
        Ok(engine.report())
    }
}

//! Pluggable detection strategies.
//!
//! Every [`Analyzer`] reads the full, immutable series set and produces
//! outliers and inliers for each series it trusts itself on. Before
//! classifying a series an analyzer runs a reliability self-check on its own
//! fit; an unreliable analyzer abstains on that series entirely.
//!
//! Strategies:
//! - [`trend`]: polynomial trend regression forecaster
//! - [`random_walk`]: first-difference (delta) regression
//! - [`moving_average`]: trailing-window mean

pub mod moving_average;
pub mod random_walk;
pub mod regression;
pub mod trend;

use serde::Serialize;
use uuid::Uuid;

use tsod_core::{AnalyzerId, Inlier, Outlier, Series, SeriesSet};

pub use moving_average::MovingAverageAnalyzer;
pub use random_walk::RandomWalkAnalyzer;
pub use trend::TrendRegressionAnalyzer;

/// Per-run information handed to every analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisContext {
    pub run_id: Uuid,
    /// Run label from the configuration.
    pub name: String,
    /// Active bucket width in seconds.
    pub resolution: i64,
}

impl AnalysisContext {
    pub fn new(name: impl Into<String>, resolution: i64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            name: name.into(),
            resolution,
        }
    }
}

/// Findings of one analyzer over a whole series set.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    pub outliers: Vec<Outlier>,
    pub inliers: Vec<Inlier>,
}

impl AnalyzerOutput {
    /// True when the analyzer produced no verdict at all.
    pub fn is_empty(&self) -> bool {
        self.outliers.is_empty() && self.inliers.is_empty()
    }
}

/// A detection strategy.
///
/// Implementations must not keep mutable state between runs.
pub trait Analyzer: Send + Sync {
    /// Human-readable name for logging and reports.
    fn name(&self) -> &str;

    /// Consensus score contributed per outlier (before magnitude).
    fn outlier_weight(&self) -> f64 {
        1.0
    }

    /// Consensus score removed per inlier.
    fn inlier_weight(&self) -> f64 {
        0.5
    }

    fn id(&self) -> AnalyzerId {
        AnalyzerId {
            name: self.name().to_string(),
            outlier_weight: self.outlier_weight(),
            inlier_weight: self.inlier_weight(),
        }
    }

    /// Analyze every series in `series`.
    fn analyze(&self, ctx: &AnalysisContext, series: &SeriesSet) -> AnalyzerOutput;
}

/// Relative tolerance: half the model's relative error, floored at `min`.
pub fn relative_fraction(relative_error: f64, min: f64) -> f64 {
    if relative_error.is_finite() {
        (0.5 * relative_error).max(min)
    } else {
        min
    }
}

/// Acceptance band around a forecast.
///
/// Takes the looser of an absolute band (training standard deviation) and a
/// relative band (`fraction` of the forecast magnitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ToleranceBand {
    pub fn new(forecast: f64, stddev: f64, fraction: f64) -> Self {
        let relative = forecast.abs() * fraction;
        Self {
            forecast,
            lower: (forecast - stddev).min(forecast - relative),
            upper: (forecast + stddev).max(forecast + relative),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Classify one observed point against its band and record the verdict.
///
/// Out-of-band points vetoed by the series alert policy produce neither an
/// outlier nor an inlier.
pub(crate) fn judge(
    id: &AnalyzerId,
    series: &Series,
    timestamp: i64,
    value: f64,
    band: ToleranceBand,
    out: &mut AnalyzerOutput,
) {
    if band.contains(value) {
        out.inliers.push(Inlier {
            analyzer: id.clone(),
            series: series.name().to_string(),
            timestamp,
        });
        return;
    }
    if !series.alert_policy().accepts(value, band.lower, band.upper) {
        return;
    }
    out.outliers.push(Outlier {
        analyzer: id.clone(),
        series: series.name().to_string(),
        timestamp,
        value,
        lower_bound: band.lower,
        upper_bound: band.upper,
        forecast: Some(band.forecast),
        magnitude: Outlier::magnitude_for(value, band.lower, band.upper),
    });
}

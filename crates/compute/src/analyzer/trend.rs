//! Polynomial trend regression.
//!
//! Fits a low-degree polynomial over the sanitized train partition and
//! extrapolates it across the classify partition. The fit must explain the
//! training data well before the analyzer will vote on a series.

use tracing::{debug, info, warn};

use tsod_core::{AnalyzerId, Series, SeriesSet};

use super::regression::{total_sum_of_squares, FitQuality, PolynomialFit};
use super::{judge, relative_fraction, AnalysisContext, Analyzer, AnalyzerOutput, ToleranceBand};

/// Polynomial trend forecaster.
#[derive(Debug, Clone)]
pub struct TrendRegressionAnalyzer {
    pub degree: usize,
    /// Largest acceptable `MSE / TSS` before the fit is considered unreliable.
    pub max_relative_mse: f64,
    /// Floor for the relative band fraction.
    pub min_band_fraction: f64,
}

impl Default for TrendRegressionAnalyzer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TrendRegressionAnalyzer {
    pub const NAME: &'static str = "trend_regression";

    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            max_relative_mse: 0.02,
            min_band_fraction: 0.05,
        }
    }

    fn analyze_series(&self, id: &AnalyzerId, ctx: &AnalysisContext, series: &Series, out: &mut AnalyzerOutput) {
        let (Some(train), Some(stats)) = (series.train(), series.stats()) else {
            warn!(run = %ctx.run_id, series = series.name(), "series not prepared, skipping");
            return;
        };
        let points: Vec<(f64, f64)> = train.iter().map(|(&ts, &v)| (ts as f64, v)).collect();
        let Some(fit) = PolynomialFit::fit(&points, self.degree) else {
            info!(series = series.name(), "trend regression: singular fit, abstaining");
            return;
        };

        let quality = FitQuality::evaluate(&points, fit.degree() + 1, |x| fit.predict(x));
        let tsos = total_sum_of_squares(train.values());
        debug!(
            series = series.name(),
            degree = fit.degree(),
            mse = quality.mse,
            mad = quality.mad,
            mape = quality.mape,
            aic = quality.aic,
            tsos,
            "trend regression fit"
        );

        let relative_mse = if tsos > 0.0 { quality.mse / tsos } else { 0.0 };
        if relative_mse > self.max_relative_mse {
            info!(
                series = series.name(),
                relative_mse,
                max = self.max_relative_mse,
                "trend regression unreliable: relative MSE too high"
            );
            return;
        }
        if stats.stddev > 0.0 && quality.mad > stats.stddev {
            info!(
                series = series.name(),
                mad = quality.mad,
                stddev = stats.stddev,
                "trend regression unreliable: MAD exceeds standard deviation"
            );
            return;
        }
        if quality.mad > stats.avg {
            info!(
                series = series.name(),
                mad = quality.mad,
                avg = stats.avg,
                "trend regression unreliable: MAD exceeds average"
            );
            return;
        }

        let fraction = relative_fraction(relative_mse, self.min_band_fraction);
        for (ts, value) in series.classify() {
            let band = ToleranceBand::new(fit.predict(ts as f64), stats.stddev, fraction);
            judge(id, series, ts, value, band, out);
        }
    }
}

impl Analyzer for TrendRegressionAnalyzer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(&self, ctx: &AnalysisContext, series: &SeriesSet) -> AnalyzerOutput {
        let id = self.id();
        let mut out = AnalyzerOutput::default();
        for s in series.values() {
            self.analyze_series(&id, ctx, s, &mut out);
        }
        out
    }
}

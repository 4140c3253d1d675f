//! Random-walk (first difference) regression.
//!
//! Models the step between consecutive training points as a linear function
//! of time and compounds the predicted steps forward from the last training
//! value.

use tracing::{debug, info, warn};

use tsod_core::{AnalyzerId, Series, SeriesSet};

use super::regression::SimpleRegression;
use super::{judge, relative_fraction, AnalysisContext, Analyzer, AnalyzerOutput, ToleranceBand};

#[derive(Debug, Clone)]
pub struct RandomWalkAnalyzer {
    /// Largest acceptable `SSE / SST` of the delta regression.
    pub max_relative_mse: f64,
    pub min_band_fraction: f64,
}

impl Default for RandomWalkAnalyzer {
    fn default() -> Self {
        Self {
            max_relative_mse: 0.05,
            min_band_fraction: 0.02,
        }
    }
}

impl RandomWalkAnalyzer {
    pub const NAME: &'static str = "random_walk";

    fn analyze_series(&self, id: &AnalyzerId, ctx: &AnalysisContext, series: &Series, out: &mut AnalyzerOutput) {
        let (Some(deltas), Some(stats), Some(last)) =
            (series.train_deltas(), series.stats(), series.last_train_value())
        else {
            warn!(run = %ctx.run_id, series = series.name(), "series not prepared, skipping");
            return;
        };
        let points: Vec<(f64, f64)> = deltas.iter().map(|(&ts, &d)| (ts as f64, d)).collect();
        let Some(regression) = SimpleRegression::fit(&points) else {
            info!(
                series = series.name(),
                deltas = points.len(),
                "random walk: too few deltas, abstaining"
            );
            return;
        };

        let mut relative_mse = regression.relative_error();
        if !relative_mse.is_finite() {
            relative_mse = 0.0;
        }
        debug!(
            series = series.name(),
            slope = regression.slope,
            intercept = regression.intercept,
            relative_mse,
            "random walk delta regression"
        );
        if relative_mse > self.max_relative_mse {
            info!(
                series = series.name(),
                relative_mse,
                max = self.max_relative_mse,
                "random walk unreliable: relative MSE too high"
            );
            return;
        }

        let fraction = relative_fraction(relative_mse, self.min_band_fraction);
        let mut forecast = last;
        for (ts, value) in series.classify() {
            forecast += regression.predict(ts as f64);
            judge(id, series, ts, value, ToleranceBand::new(forecast, stats.stddev, fraction), out);
        }
    }
}

impl Analyzer for RandomWalkAnalyzer {
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

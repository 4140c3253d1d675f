//! Trailing moving-average forecaster.
//!
//! Forecasts every classify point as the mean of the last `window` training
//! values. Reliability is judged by how well one-step window means predict
//! the training data itself.

use tracing::{debug, info, warn};

use tsod_core::{AnalyzerId, Series, SeriesSet};

use super::{judge, relative_fraction, AnalysisContext, Analyzer, AnalyzerOutput, ToleranceBand};

#[derive(Debug, Clone)]
pub struct MovingAverageAnalyzer {
    pub window: usize,
    /// Largest acceptable one-step `MSE / variance`.
    pub max_relative_mse: f64,
    pub min_band_fraction: f64,
}

impl Default for MovingAverageAnalyzer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl MovingAverageAnalyzer {
    pub const NAME: &'static str = "moving_average";

    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            max_relative_mse: 0.1,
            min_band_fraction: 0.05,
        }
    }

    fn analyze_series(&self, id: &AnalyzerId, ctx: &AnalysisContext, series: &Series, out: &mut AnalyzerOutput) {
        let (Some(train), Some(stats)) = (series.train(), series.stats()) else {
            warn!(run = %ctx.run_id, series = series.name(), "series not prepared, skipping");
            return;
        };
        let values: Vec<f64> = train.values().copied().collect();
        let w = self.window;
        if values.len() <= w {
            info!(
                series = series.name(),
                train = values.len(),
                window = w,
                "moving average: train partition shorter than window, abstaining"
            );
            return;
        }

        let mut sse = 0.0;
        for i in w..values.len() {
            let mean = values[i - w..i].iter().sum::<f64>() / w as f64;
            sse += (values[i] - mean).powi(2);
        }
        let mse = sse / (values.len() - w) as f64;
        let variance = stats.stddev * stats.stddev;
        let relative_mse = if variance > 0.0 {
            mse / variance
        } else if mse == 0.0 {
            0.0
        } else {
            f64::INFINITY
        };
        debug!(series = series.name(), window = w, mse, relative_mse, "moving average fit");
        if relative_mse > self.max_relative_mse {
            info!(
                series = series.name(),
                relative_mse,
                max = self.max_relative_mse,
                "moving average unreliable: relative MSE too high"
            );
            return;
        }

        let forecast = values[values.len() - w..].iter().sum::<f64>() / w as f64;
        let band = ToleranceBand::new(forecast, stats.stddev, relative_fraction(relative_mse, self.min_band_fraction));
        for (ts, value) in series.classify() {
            judge(id, series, ts, value, band, out);
        }
    }
}

impl Analyzer for MovingAverageAnalyzer {
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

//! Named, timestamp-ordered numeric series with train/classify partitioning.
//!
//! A [`Series`] moves through three states:
//!
//! - `Uninitialized`: created, no data yet.
//! - `Raw`: data set and size-validated, no statistics.
//! - `Prepared`: the train partition has been extracted and sanitized and the
//!   training statistics are frozen.
//!
//! Replacing the data (including a rollup) always drops back to `Raw`, so
//! statistics can never go stale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TsodError};

/// Every prepared series of a run, keyed by name.
pub type SeriesSet = BTreeMap<String, Series>;

/// Fraction of points initially assigned to the train partition.
pub const TRAIN_CLASSIFY_SPLIT: f64 = 0.7;

/// Training values further than this many standard deviations from the
/// mean are replaced during sanitization.
pub const SANITIZE_STDDEV_FACTOR: f64 = 6.0;

/// Summary statistics over the (sanitized) train partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainStats {
    pub avg: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

impl TrainStats {
    /// Compute statistics over a set of values. Returns `None` when empty.
    pub fn compute<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter();
        let mut count = 0usize;
        let mut total = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in iter.clone() {
            count += 1;
            total += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return None;
        }
        let avg = total / count as f64;
        let variance = iter.map(|v| (v - avg).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            avg,
            stddev: variance.sqrt(),
            min,
            max,
        })
    }

    /// Distance between the largest and smallest training value.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Which out-of-band directions count as outliers for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Alert when the value is above the tolerance band.
    pub over: bool,
    /// Alert when the value is below the tolerance band.
    pub under: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            over: true,
            under: true,
        }
    }
}

impl AlertPolicy {
    /// Policy for error counts: lower than expected is never anomalous.
    pub fn over_only() -> Self {
        Self {
            over: true,
            under: false,
        }
    }

    /// Whether an out-of-band `value` should be reported given the band.
    pub fn accepts(&self, value: f64, lower: f64, upper: f64) -> bool {
        if value < lower && !self.under {
            return false;
        }
        if value > upper && !self.over {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone)]
struct Prepared {
    train: BTreeMap<i64, f64>,
    stats: TrainStats,
    replaced: usize,
}

#[derive(Debug, Clone)]
enum SeriesState {
    Uninitialized,
    Raw,
    Prepared(Prepared),
}

/// One named time series.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    resolution: i64,
    forecast_horizon: usize,
    data: BTreeMap<i64, f64>,
    alert_policy: AlertPolicy,
    state: SeriesState,
}

impl Series {
    pub fn new(name: impl Into<String>, resolution: i64, forecast_horizon: usize) -> Self {
        Self {
            name: name.into(),
            resolution,
            forecast_horizon,
            data: BTreeMap::new(),
            alert_policy: AlertPolicy::default(),
            state: SeriesState::Uninitialized,
        }
    }

    /// Build a series and bring it straight to the prepared state.
    pub fn with_data(
        name: impl Into<String>,
        resolution: i64,
        forecast_horizon: usize,
        data: BTreeMap<i64, f64>,
    ) -> Result<Self> {
        let mut series = Self::new(name, resolution, forecast_horizon);
        series.set_data(data)?;
        series.prepare()?;
        Ok(series)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution(&self) -> i64 {
        self.resolution
    }

    pub fn forecast_horizon(&self) -> usize {
        self.forecast_horizon
    }

    pub fn data(&self) -> &BTreeMap<i64, f64> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        self.alert_policy
    }

    pub fn set_alert_policy(&mut self, policy: AlertPolicy) {
        self.alert_policy = policy;
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, SeriesState::Prepared(_))
    }

    /// Replace the data set. Invalidates any cached statistics.
    ///
    /// Fails when there are fewer points than the forecast horizon.
    pub fn set_data(&mut self, data: BTreeMap<i64, f64>) -> Result<()> {
        if data.len() < self.forecast_horizon {
            return Err(TsodError::InsufficientData {
                series: self.name.clone(),
                points: data.len(),
                required: self.forecast_horizon,
            });
        }
        self.data = data;
        self.state = SeriesState::Raw;
        Ok(())
    }

    /// Number of points in the train partition.
    ///
    /// Starts at `floor(N * 0.7)` and grows so the classify partition never
    /// holds more than `forecast_horizon` points.
    pub fn train_len(&self) -> usize {
        let n = self.data.len();
        let mut train = (n as f64 * TRAIN_CLASSIFY_SPLIT).floor() as usize;
        if n - train > self.forecast_horizon {
            train = n - self.forecast_horizon;
        }
        train
    }

    pub fn classify_len(&self) -> usize {
        self.data.len() - self.train_len()
    }

    /// Extract and sanitize the train partition and freeze its statistics.
    pub fn prepare(&mut self) -> Result<TrainStats> {
        match &self.state {
            SeriesState::Prepared(p) => return Ok(p.stats),
            SeriesState::Uninitialized => {
                return Err(TsodError::InsufficientData {
                    series: self.name.clone(),
                    points: 0,
                    required: self.forecast_horizon,
                })
            }
            SeriesState::Raw => {}
        }

        let train_len = self.train_len();
        if train_len == 0 {
            return Err(TsodError::EmptyPartition {
                series: self.name.clone(),
                partition: "train",
            });
        }
        if self.classify_len() == 0 {
            return Err(TsodError::EmptyPartition {
                series: self.name.clone(),
                partition: "classify",
            });
        }

        let mut train: BTreeMap<i64, f64> = self
            .data
            .iter()
            .take(train_len)
            .map(|(&ts, &v)| (ts, v))
            .collect();
        let mut stats = TrainStats::compute(train.values())
            .ok_or_else(|| TsodError::NotPrepared(self.name.clone()))?;

        let replaced = sanitize_train(&mut train, &stats);
        if replaced > 0 {
            debug!(
                series = %self.name,
                replaced,
                avg = stats.avg,
                stddev = stats.stddev,
                "sanitized training outliers"
            );
            stats = TrainStats::compute(train.values())
                .ok_or_else(|| TsodError::NotPrepared(self.name.clone()))?;
        }

        self.state = SeriesState::Prepared(Prepared {
            train,
            stats,
            replaced,
        });
        Ok(stats)
    }

    /// Frozen training statistics, if prepared.
    pub fn stats(&self) -> Option<&TrainStats> {
        match &self.state {
            SeriesState::Prepared(p) => Some(&p.stats),
            _ => None,
        }
    }

    /// Sanitized train partition, if prepared.
    pub fn train(&self) -> Option<&BTreeMap<i64, f64>> {
        match &self.state {
            SeriesState::Prepared(p) => Some(&p.train),
            _ => None,
        }
    }

    /// How many training values sanitization replaced.
    pub fn replaced_count(&self) -> usize {
        match &self.state {
            SeriesState::Prepared(p) => p.replaced,
            _ => 0,
        }
    }

    /// Points after the train partition, in timestamp order.
    pub fn classify(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.data
            .iter()
            .skip(self.train_len())
            .map(|(&ts, &v)| (ts, v))
    }

    /// First differences of the sanitized train partition, keyed by the later timestamp.
    pub fn train_deltas(&self) -> Option<BTreeMap<i64, f64>> {
        let train = self.train()?;
        let mut deltas = BTreeMap::new();
        let mut previous: Option<f64> = None;
        for (&ts, &v) in train {
            if let Some(p) = previous {
                deltas.insert(ts, v - p);
            }
            previous = Some(v);
        }
        Some(deltas)
    }

    /// Last sanitized training value.
    pub fn last_train_value(&self) -> Option<f64> {
        self.train()?.values().next_back().copied()
    }

    /// The most recent `n` values, oldest first.
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let skip = self.data.len().saturating_sub(n);
        self.data.values().skip(skip).copied().collect()
    }

    /// Coarsen to `resolution` by summing values that share a new bucket.
    pub fn rollup(&mut self, resolution: i64) -> Result<()> {
        let mut rolled: BTreeMap<i64, f64> = BTreeMap::new();
        for (&ts, &v) in &self.data {
            *rolled.entry(crate::sample::bucket(ts, resolution)).or_default() += v;
        }
        self.resolution = resolution;
        self.set_data(rolled)
    }
}

/// Replace training values beyond [`SANITIZE_STDDEV_FACTOR`] standard
/// deviations with the average of the overall mean and the last normal value.
///
/// Returns the number of replaced points.
pub fn sanitize_train(train: &mut BTreeMap<i64, f64>, stats: &TrainStats) -> usize {
    let min = stats.avg - stats.stddev * SANITIZE_STDDEV_FACTOR;
    let max = stats.avg + stats.stddev * SANITIZE_STDDEV_FACTOR;
    let mut previous = stats.avg;
    let mut replaced = 0;
    for (ts, value) in train.iter_mut() {
        if *value < min || *value > max {
            let replacement = (stats.avg + previous) / 2.0;
            debug!(
                ts = *ts,
                value = *value,
                replacement,
                "replacing training outlier"
            );
            *value = replacement;
            replaced += 1;
            continue;
        }
        previous = *value;
    }
    replaced
}

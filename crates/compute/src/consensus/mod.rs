//! Cross-analyzer consensus scoring and validation.
//!
//! Every raw outlier adds `outlier_weight + magnitude` to the score of its
//! timestamp and every inlier subtracts `inlier_weight`, so a timestamp only
//! surfaces when the analyzers that trust themselves on it mostly agree.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, error, info};

use tsod_core::{Inlier, Outlier, OutlierDetails, SeriesSet, ValidatedOutlier};

/// Default minimum net score for a timestamp to be reported.
pub const DEFAULT_MIN_SCORE: f64 = 1.0;

/// Default number of recent values per series attached to a report.
pub const DEFAULT_SNAPSHOT_POINTS: usize = 10;

/// Net consensus score per timestamp.
pub fn score(outliers: &[Outlier], inliers: &[Inlier]) -> BTreeMap<i64, f64> {
    let mut scores: BTreeMap<i64, f64> = BTreeMap::new();
    for o in outliers {
        *scores.entry(o.timestamp).or_default() += o.analyzer.outlier_weight + o.magnitude;
    }
    for i in inliers {
        *scores.entry(i.timestamp).or_default() -= i.analyzer.inlier_weight;
    }
    scores
}

/// Number of raw outliers per timestamp, regardless of score.
pub fn outlier_counts(outliers: &[Outlier]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for o in outliers {
        *counts.entry(o.timestamp).or_default() += 1;
    }
    counts
}

/// The last `points` values of every series, oldest first.
pub fn snapshot(series: &SeriesSet, points: usize) -> BTreeMap<String, Vec<f64>> {
    series
        .iter()
        .map(|(name, s)| (name.clone(), s.tail(points)))
        .collect()
}

/// Outcome of comparing validated outliers against known anomalies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossCheck {
    /// Expected timestamps that collected no raw outlier at all.
    pub missed: Vec<i64>,
    /// Reported timestamps absent from the expected list.
    pub unexpected: Vec<i64>,
}

/// Compare `expected` timestamps with the raw outlier counts and the reported set.
///
/// Purely diagnostic: misses are logged at error level, unexpected reports
/// at info level.
pub fn cross_check_expected(
    expected: &[i64],
    counts: &BTreeMap<i64, usize>,
    validated: &[ValidatedOutlier],
) -> CrossCheck {
    let mut check = CrossCheck::default();
    for &ts in expected {
        let hits = counts.get(&ts).copied().unwrap_or(0);
        if hits == 0 {
            error!(ts, "Expected error not detected");
            check.missed.push(ts);
        } else {
            debug!(ts, hits, "Expected error detected");
        }
    }

    let expected: BTreeSet<i64> = expected.iter().copied().collect();
    for v in validated {
        if !expected.contains(&v.timestamp) {
            info!(ts = v.timestamp, score = v.score, "Unexpected outlier reported");
            check.unexpected.push(v.timestamp);
        }
    }
    check
}

/// Validated outliers plus the expected-error cross-check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validation {
    pub outliers: Vec<ValidatedOutlier>,
    #[serde(flatten)]
    pub cross_check: CrossCheck,
}

/// Merges the raw findings of one orchestrator run into reported outliers.
pub struct ConsensusValidator<'a> {
    outliers: &'a [Outlier],
    inliers: &'a [Inlier],
    series: &'a SeriesSet,
    snapshot_points: usize,
}

impl<'a> ConsensusValidator<'a> {
    pub fn new(outliers: &'a [Outlier], inliers: &'a [Inlier], series: &'a SeriesSet) -> Self {
        Self {
            outliers,
            inliers,
            series,
            snapshot_points: DEFAULT_SNAPSHOT_POINTS,
        }
    }

    pub fn with_snapshot_points(mut self, points: usize) -> Self {
        self.snapshot_points = points;
        self
    }

    /// Timestamps with a net score of at least `min_score`, in timestamp order.
    pub fn validate(&self, min_score: f64) -> Vec<ValidatedOutlier> {
        let scores = score(self.outliers, self.inliers);
        let mut by_timestamp: BTreeMap<i64, Vec<Outlier>> = BTreeMap::new();
        for o in self.outliers {
            by_timestamp.entry(o.timestamp).or_default().push(o.clone());
        }

        let mut validated = Vec::new();
        for (ts, outliers) in by_timestamp {
            let net = scores.get(&ts).copied().unwrap_or(0.0);
            if net < min_score {
                debug!(ts, score = net, min_score, "Outlier suppressed by consensus");
                continue;
            }
            validated.push(ValidatedOutlier {
                timestamp: ts,
                score: net,
                details: OutlierDetails {
                    outliers,
                    timeseries_snapshot: snapshot(self.series, self.snapshot_points),
                },
            });
        }
        info!(
            "Consensus: {} of {} candidate timestamps reported (min score {})",
            validated.len(),
            scores.len(),
            min_score
        );
        validated
    }

    /// Validate and cross-check against known anomalous timestamps.
    pub fn validate_against(&self, min_score: f64, expected: &[i64]) -> Validation {
        let outliers = self.validate(min_score);
        let cross_check = cross_check_expected(expected, &outlier_counts(self.outliers), &outliers);
        Validation { outliers, cross_check }
    }
}

#[cfg(test)]
mod tests;

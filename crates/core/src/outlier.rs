use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity and voting weights of the analyzer that produced a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerId {
    pub name: String,
    /// Added to a timestamp's consensus score per outlier.
    pub outlier_weight: f64,
    /// Subtracted from a timestamp's consensus score per inlier.
    pub inlier_weight: f64,
}

/// A classify-partition point that fell outside an analyzer's tolerance band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub analyzer: AnalyzerId,
    pub series: String,
    pub timestamp: i64,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
    /// Distance outside the band, in band widths.
    pub magnitude: f64,
}

impl Outlier {
    /// Distance of `value` outside `[lower, upper]` normalized by the band width.
    ///
    /// A degenerate (zero-width) band falls back to the absolute distance.
    pub fn magnitude_for(value: f64, lower: f64, upper: f64) -> f64 {
        let distance = if value > upper {
            value - upper
        } else if value < lower {
            lower - value
        } else {
            0.0
        };
        let width = upper - lower;
        if width > f64::EPSILON {
            distance / width
        } else {
            distance
        }
    }
}

/// A classify-partition point an analyzer positively confirmed as expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inlier {
    pub analyzer: AnalyzerId,
    pub series: String,
    pub timestamp: i64,
}

/// A timestamp whose net consensus score reached the reporting threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedOutlier {
    pub timestamp: i64,
    pub score: f64,
    #[serde(flatten)]
    pub details: OutlierDetails,
}

/// Diagnostic payload attached to a validated outlier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlierDetails {
    /// Every raw outlier reported for the timestamp.
    pub outliers: Vec<Outlier>,
    /// Most recent values per series, oldest first.
    pub timeseries_snapshot: BTreeMap<String, Vec<f64>>,
}

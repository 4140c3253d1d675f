use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsodError};

/// Raw samples of one series as delivered by a loader: timestamp string -> value string.
pub type RawSeries = BTreeMap<String, String>;

/// Raw samples of every series, keyed by series name.
pub type RawSamples = BTreeMap<String, RawSeries>;

/// A single parsed observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the epoch.
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    /// Parse a raw key/value pair belonging to `series`.
    pub fn parse(series: &str, raw_ts: &str, raw_value: &str) -> Result<Self> {
        let timestamp = raw_ts
            .trim()
            .parse::<i64>()
            .map_err(|_| TsodError::InvalidTimestamp {
                series: series.to_string(),
                raw: raw_ts.to_string(),
            })?;
        let value = raw_value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TsodError::InvalidValue {
                series: series.to_string(),
                raw: raw_value.to_string(),
            })?;
        Ok(Self { timestamp, value })
    }
}

/// Start of the `resolution`-wide bucket containing `timestamp`.
pub fn bucket(timestamp: i64, resolution: i64) -> i64 {
    timestamp - timestamp.rem_euclid(resolution)
}

/// Parse and bucket a raw series. Values landing in the same bucket are summed.
pub fn parse_raw_series(series: &str, raw: &RawSeries, resolution: i64) -> Result<BTreeMap<i64, f64>> {
    let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
    for (raw_ts, raw_value) in raw {
        let sample = Sample::parse(series, raw_ts, raw_value)?;
        *buckets.entry(bucket(sample.timestamp, resolution)).or_default() += sample.value;
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_aligns_to_resolution() {
        assert_eq!(bucket(125, 60), 120);
        assert_eq!(bucket(120, 60), 120);
        assert_eq!(bucket(59, 60), 0);
        assert_eq!(bucket(-1, 60), -60);
    }

    #[test]
    fn collisions_are_summed() {
        let raw: RawSeries = [("60", "1.5"), ("61", "2"), ("119", "0.5"), ("120", "4")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let parsed = parse_raw_series("regular", &raw, 60).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&60], 4.0);
        assert_eq!(parsed[&120], 4.0);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            Sample::parse("s", "abc", "1"),
            Err(TsodError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            Sample::parse("s", "10", "x"),
            Err(TsodError::InvalidValue { .. })
        ));
        assert!(matches!(
            Sample::parse("s", "10", "NaN"),
            Err(TsodError::InvalidValue { .. })
        ));
    }
}

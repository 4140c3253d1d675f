use std::collections::BTreeMap;

use tracing::debug;

use tsod_core::sample::parse_raw_series;
use tsod_core::{AlertPolicy, DetectorConfig, RawSamples, Result, Series, SeriesSet};

/// Name of the raw error-count series. Lower-than-expected errors never alert.
pub const ERROR_SERIES: &str = "error";

/// Parse, bucket, normalize and gap-fill every raw series.
///
/// Series that end up empty are dropped. A series with fewer points than the
/// forecast horizon aborts the whole load.
pub fn ingest(raw: &RawSamples, config: &DetectorConfig) -> Result<SeriesSet> {
    let mut set = SeriesSet::new();

    for (name, raw_series) in raw {
        let mut buckets = parse_raw_series(name, raw_series, config.resolution)?;

        if let Some(mode) = config.normalization {
            for value in buckets.values_mut() {
                *value = mode.apply(*value);
            }
        }

        let filled = fill_gaps(&buckets, config.resolution);
        if filled.is_empty() {
            debug!(series = %name, "skipping empty series");
            continue;
        }

        let mut series = Series::new(name.clone(), config.resolution, config.forecast_horizon);
        series.set_data(filled)?;
        series.prepare()?;
        if name == ERROR_SERIES {
            series.set_alert_policy(AlertPolicy::over_only());
        }

        debug!(
            series = %name,
            points = series.len(),
            raw_points = raw_series.len(),
            "ingested series"
        );
        set.insert(name.clone(), series);
    }

    Ok(set)
}

/// Insert zero-valued points at every missing step between adjacent buckets.
pub fn fill_gaps(data: &BTreeMap<i64, f64>, resolution: i64) -> BTreeMap<i64, f64> {
    let mut filled = data.clone();
    let mut previous: Option<i64> = None;
    for &ts in data.keys() {
        if let Some(prev) = previous {
            let mut gap = prev + resolution;
            while gap < ts {
                filled.insert(gap, 0.0);
                gap += resolution;
            }
        }
        previous = Some(ts);
    }
    filled
}

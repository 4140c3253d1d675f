use std::collections::BTreeMap;

use tracing::{debug, info};

use tsod_core::{NormalizationMode, Result, SeriesSet, TsodError};

/// Train max-min span at which a series is log-normalized automatically.
pub const AUTO_LOG_SPAN: f64 = 1000.0;

/// Log-normalize every series whose training span is at least [`AUTO_LOG_SPAN`].
///
/// Returns the names of the normalized series.
pub fn auto_normalize(set: &mut SeriesSet) -> Result<Vec<String>> {
    let mut normalized = Vec::new();
    for (name, series) in set.iter_mut() {
        let stats = *series
            .stats()
            .ok_or_else(|| TsodError::NotPrepared(name.clone()))?;
        if stats.span() < AUTO_LOG_SPAN {
            continue;
        }

        info!(series = %name, span = stats.span(), "normalizing data");
        debug!(
            series = %name,
            min = stats.min,
            max = stats.max,
            avg = stats.avg,
            stddev = stats.stddev,
            "statistics before normalization"
        );

        let data: BTreeMap<i64, f64> = series
            .data()
            .iter()
            .map(|(&ts, &v)| (ts, NormalizationMode::Log.apply(v)))
            .collect();
        series.set_data(data)?;
        let after = series.prepare()?;
        debug!(
            series = %name,
            min = after.min,
            max = after.max,
            avg = after.avg,
            stddev = after.stddev,
            "statistics after normalization"
        );
        normalized.push(name.clone());
    }
    Ok(normalized)
}

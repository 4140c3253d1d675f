use std::collections::BTreeMap;

use tracing::debug;

use tsod_core::{AlertPolicy, Result, Series, SeriesSet, TsodError};

use super::ingest::ERROR_SERIES;

/// Name of the base request-count series.
pub const REGULAR_SERIES: &str = "regular";

/// Name of the derived error-rate series.
pub const ERROR_RATE_SERIES: &str = "error_rate";

/// Both base series need at least this training average; sparse data makes
/// the ratio too noisy.
pub const MIN_DERIVE_AVG: f64 = 10.0;

/// Errors per regular request for one bucket.
///
/// Errors without any regular traffic count as a 100% error rate.
pub fn error_rate(regular: f64, errors: f64) -> f64 {
    if regular > 0.0 && errors > 0.0 {
        errors / regular
    } else if errors > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Add an `error_rate` series when both `regular` and `error` exist and are
/// dense enough. Returns whether the series was derived.
pub fn derive_error_rate(set: &mut SeriesSet) -> Result<bool> {
    let (Some(regular), Some(errors)) = (set.get(REGULAR_SERIES), set.get(ERROR_SERIES)) else {
        return Ok(false);
    };

    let regular_avg = regular
        .stats()
        .ok_or_else(|| TsodError::NotPrepared(REGULAR_SERIES.to_string()))?
        .avg;
    let error_avg = errors
        .stats()
        .ok_or_else(|| TsodError::NotPrepared(ERROR_SERIES.to_string()))?
        .avg;
    if regular_avg < MIN_DERIVE_AVG || error_avg < MIN_DERIVE_AVG {
        debug!(
            regular_avg,
            error_avg,
            threshold = MIN_DERIVE_AVG,
            "not deriving error rate, averages below threshold"
        );
        return Ok(false);
    }

    let rates: BTreeMap<i64, f64> = regular
        .data()
        .iter()
        .map(|(ts, &r)| {
            let e = errors.data().get(ts).copied().unwrap_or(0.0);
            (*ts, error_rate(r, e))
        })
        .collect();

    let mut derived = Series::new(
        ERROR_RATE_SERIES,
        regular.resolution(),
        regular.forecast_horizon(),
    );
    derived.set_data(rates)?;
    derived.prepare()?;
    derived.set_alert_policy(AlertPolicy::over_only());

    debug!(points = derived.len(), "derived error rate series");
    set.insert(ERROR_RATE_SERIES.to_string(), derived);
    Ok(true)
}

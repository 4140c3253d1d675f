//! Preparation pipeline.
//!
//! Turns raw, irregular samples into clean, gap-free, prepared series:
//!
//! 1. [`ingest`]: parse, bucket, sum collisions, normalize (explicit mode), fill gaps.
//! 2. [`rollup`]: coarsen all series together while any is too long.
//! 3. [`derive`]: add the `error_rate` series when possible.
//! 4. [`normalize`]: log-normalize wide-range series when no mode is configured.

pub mod derive;
pub mod ingest;
pub mod normalize;
pub mod rollup;

use tracing::{debug, info};

use tsod_core::{DetectorConfig, RawSamples, Result, SeriesSet};

/// Output of the preparation pipeline.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Final bucket width after any auto-rollup.
    pub resolution: i64,
    pub series: SeriesSet,
}

/// Run the full preparation pipeline over raw samples.
pub fn prepare(raw: &RawSamples, config: &DetectorConfig) -> Result<PreparedData> {
    let mut series = ingest::ingest(raw, config)?;
    let resolution = rollup::auto_rollup(&mut series, config.resolution)?;
    if resolution != config.resolution {
        info!(from = config.resolution, to = resolution, "auto rollup applied");
    }

    derive::derive_error_rate(&mut series)?;

    if config.normalization.is_none() {
        auto_normalize_logged(&mut series)?;
    }

    prepare_all(&mut series)?;
    debug!(series = series.len(), resolution, "preparation complete");
    Ok(PreparedData { resolution, series })
}

fn auto_normalize_logged(series: &mut SeriesSet) -> Result<()> {
    let normalized = normalize::auto_normalize(series)?;
    if !normalized.is_empty() {
        debug!(series = ?normalized, "auto log normalization applied");
    }
    Ok(())
}

/// Make sure every series is in the prepared state.
pub fn prepare_all(series: &mut SeriesSet) -> Result<()> {
    for s in series.values_mut() {
        s.prepare()?;
    }
    Ok(())
}

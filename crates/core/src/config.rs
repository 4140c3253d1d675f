use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TsodError};
use crate::normalize::NormalizationMode;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_TSOD_{KEY} first, falls back to TSOD_{KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_TSOD_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(&format!("TSOD_{}", key))
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| TsodError::Config(format!("invalid value '{}' for '{}'", raw, key)))
}

/// How the orchestrator dispatches analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    /// Run analyzers one after another on the calling thread.
    Sequential,
    /// Run analyzers on a worker pool. `threads == 0` means one thread per analyzer.
    Parallel { threads: usize },
}

impl Concurrency {
    /// Pool size for `analyzers` tasks, or `None` in sequential mode.
    pub fn pool_size(&self, analyzers: usize) -> Option<usize> {
        match *self {
            Concurrency::Sequential => None,
            Concurrency::Parallel { threads: 0 } => Some(analyzers.max(1)),
            Concurrency::Parallel { threads } => Some(threads),
        }
    }
}

impl FromStr for Concurrency {
    type Err = TsodError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "sequential" => Ok(Concurrency::Sequential),
            "auto" => Ok(Concurrency::Parallel { threads: 0 }),
            other => other
                .parse::<usize>()
                .map(|threads| Concurrency::Parallel { threads })
                .map_err(|_| TsodError::Config(format!("invalid thread count '{}'", other))),
        }
    }
}

/// Immutable configuration for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Run label, included in log lines.
    pub name: String,
    /// Target bucket width in seconds (may be coarsened by auto-rollup).
    pub resolution: i64,
    /// Trailing points reserved for classification.
    pub forecast_horizon: usize,
    /// Explicit normalization; `None` enables log-on-large-range auto detection.
    pub normalization: Option<NormalizationMode>,
    /// Minimum net consensus score for a timestamp to be reported.
    pub min_score: f64,
    pub concurrency: Concurrency,
    /// Seconds to wait for dispatched analyzers before abandoning them.
    pub deadline_secs: u64,
    /// Recent values per series attached to each validated outlier.
    pub snapshot_points: usize,
    /// Degree of the trend regression polynomial.
    pub polynomial_degree: usize,
    pub moving_average_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            resolution: 60,
            forecast_horizon: 10,
            normalization: None,
            min_score: 1.0,
            concurrency: Concurrency::Parallel { threads: 0 },
            deadline_secs: 60,
            snapshot_points: 10,
            polynomial_degree: 2,
            moving_average_window: 5,
        }
    }
}

impl DetectorConfig {
    /// Defaults overlaid with `TSOD_*` environment variables (call `load_dotenv()` first).
    ///
    /// When `TSOD_PROFILE` is set (e.g. `PROD`), every key is first looked up
    /// as `PROD_TSOD_{KEY}`, falling back to `TSOD_{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_opt("TSOD_PROFILE").unwrap_or_default().to_uppercase();
        let mut settings = BTreeMap::new();
        for (key, setting) in [
            ("NAME", "name"),
            ("RESOLUTION", "resolution"),
            ("FORECAST_PERIODS", "forecast_periods"),
            ("NORMALIZATION", "normalization"),
            ("MIN_SCORE", "min_score"),
            ("THREADS", "threads"),
            ("DEADLINE_SECONDS", "deadline_seconds"),
            ("SNAPSHOT_POINTS", "snapshot_points"),
            ("POLYNOMIAL_DEGREE", "polynomial_degree"),
            ("MOVING_AVERAGE_WINDOW", "moving_average_window"),
        ] {
            if let Some(v) = profiled_env_opt(&profile, key) {
                settings.insert(setting.to_string(), v);
            }
        }
        Self::default().with_settings(&settings)
    }

    /// Overlay loader-supplied key/value settings. Unknown keys are ignored.
    pub fn with_settings(mut self, settings: &BTreeMap<String, String>) -> Result<Self> {
        for (key, raw) in settings {
            match key.to_ascii_lowercase().as_str() {
                "name" => self.name = raw.clone(),
                "resolution" | "rollup" | "desired_time_resolution" => {
                    self.resolution = parse_setting(key, raw)?
                }
                "forecast_periods" | "forecast_horizon" => {
                    self.forecast_horizon = parse_setting(key, raw)?
                }
                "normalization" => {
                    self.normalization = match raw.trim().to_ascii_lowercase().as_str() {
                        "" | "auto" => None,
                        other => Some(other.parse()?),
                    }
                }
                "min_score" => self.min_score = parse_setting(key, raw)?,
                "threads" | "concurrency" => self.concurrency = raw.parse()?,
                "deadline_seconds" => self.deadline_secs = parse_setting(key, raw)?,
                "snapshot_points" => self.snapshot_points = parse_setting(key, raw)?,
                "polynomial_degree" => self.polynomial_degree = parse_setting(key, raw)?,
                "moving_average_window" => self.moving_average_window = parse_setting(key, raw)?,
                _ => debug!(key = %key, "ignoring unrecognized setting"),
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution <= 0 {
            return Err(TsodError::Config(format!(
                "resolution must be positive (got {})",
                self.resolution
            )));
        }
        if self.forecast_horizon == 0 {
            return Err(TsodError::Config("forecast horizon must be at least 1".into()));
        }
        if self.moving_average_window == 0 {
            return Err(TsodError::Config("moving average window must be at least 1".into()));
        }
        if !self.min_score.is_finite() {
            return Err(TsodError::Config("min_score must be finite".into()));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let label = if self.name.is_empty() { "(unnamed)" } else { &self.name };
        tracing::info!("Detector config ({}):", label);
        tracing::info!("  resolution:    {}s", self.resolution);
        tracing::info!("  horizon:       {} points", self.forecast_horizon);
        tracing::info!(
            "  normalization: {}",
            self.normalization.map(|m| m.as_str()).unwrap_or("auto")
        );
        tracing::info!("  min_score:     {}", self.min_score);
        tracing::info!("  concurrency:   {:?}", self.concurrency);
        tracing::info!("  deadline:      {}s", self.deadline_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let c = DetectorConfig::default();
        assert_eq!(c.resolution, 60);
        assert_eq!(c.forecast_horizon, 10);
        assert_eq!(c.normalization, None);
        assert_eq!(c.min_score, 1.0);
        assert_eq!(c.snapshot_points, 10);
        assert_eq!(c.deadline_secs, 60);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn settings_overlay_and_aliases() {
        let c = DetectorConfig::default()
            .with_settings(&settings(&[
                ("rollup", "300"),
                ("forecast_periods", "12"),
                ("normalization", "log10"),
                ("threads", "sync"),
                ("min_score", "2.5"),
                ("unknown", "ignored"),
            ]))
            .unwrap();
        assert_eq!(c.resolution, 300);
        assert_eq!(c.forecast_horizon, 12);
        assert_eq!(c.normalization, Some(NormalizationMode::Log10));
        assert_eq!(c.concurrency, Concurrency::Sequential);
        assert_eq!(c.min_score, 2.5);
    }

    #[test]
    fn malformed_settings_are_config_errors() {
        let err = DetectorConfig::default()
            .with_settings(&settings(&[("resolution", "soon")]))
            .unwrap_err();
        assert!(matches!(err, TsodError::Config(_)));

        let err = DetectorConfig::default()
            .with_settings(&settings(&[("forecast_periods", "0")]))
            .unwrap_err();
        assert!(matches!(err, TsodError::Config(_)));
    }

    #[test]
    fn explicit_none_differs_from_auto() {
        let c = DetectorConfig::default()
            .with_settings(&settings(&[("normalization", "none")]))
            .unwrap();
        assert_eq!(c.normalization, Some(NormalizationMode::None));
        let c = c.with_settings(&settings(&[("normalization", "auto")])).unwrap();
        assert_eq!(c.normalization, None);
    }

    #[test]
    fn pool_sizes() {
        assert_eq!(Concurrency::Sequential.pool_size(3), None);
        assert_eq!(Concurrency::Parallel { threads: 0 }.pool_size(3), Some(3));
        assert_eq!(Concurrency::Parallel { threads: 0 }.pool_size(0), Some(1));
        assert_eq!(Concurrency::Parallel { threads: 2 }.pool_size(3), Some(2));
        assert_eq!("4".parse::<Concurrency>().unwrap(), Concurrency::Parallel { threads: 4 });
    }
}

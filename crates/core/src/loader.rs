use std::collections::BTreeMap;

use crate::error::Result;
use crate::sample::RawSamples;

/// Upstream data provider supplied by the host application.
///
/// Implementations fetch from files, databases or APIs; everything is
/// loaded into memory before analysis starts.
pub trait DataLoader {
    /// Arbitrary key/value settings (see `DetectorConfig::with_settings`).
    fn load_settings(&self) -> Result<BTreeMap<String, String>>;

    /// Raw samples: series name -> (timestamp string -> value string).
    fn load_raw_samples(&self) -> Result<RawSamples>;

    /// Timestamps of known anomalies, used only for diagnostic cross-checks.
    fn load_expected_errors(&self) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }
}

/// Loader over data already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    pub settings: BTreeMap<String, String>,
    pub samples: RawSamples,
    pub expected_errors: Vec<i64>,
}

impl InMemoryLoader {
    pub fn new(samples: RawSamples) -> Self {
        Self {
            samples,
            ..Default::default()
        }
    }

    /// Add a series from `(timestamp, value)` pairs.
    pub fn with_series<I>(mut self, name: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        let raw = points
            .into_iter()
            .map(|(ts, v)| (ts.to_string(), v.to_string()))
            .collect();
        self.samples.insert(name.to_string(), raw);
        self
    }

    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_expected_errors(mut self, expected: Vec<i64>) -> Self {
        self.expected_errors = expected;
        self
    }
}

impl DataLoader for InMemoryLoader {
    fn load_settings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.settings.clone())
    }

    fn load_raw_samples(&self) -> Result<RawSamples> {
        Ok(self.samples.clone())
    }

    fn load_expected_errors(&self) -> Result<Vec<i64>> {
        Ok(self.expected_errors.clone())
    }
}

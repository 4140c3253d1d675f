use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use tsod_core::{DataLoader, RawSamples};

/// Input document accepted by the CLI.
///
/// ```json
/// {
///   "settings": { "resolution": 60 },
///   "series": { "regular": { "1700000040": 12.5, "1700000100": "13" } },
///   "expected_errors": [1700000100]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    pub series: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    pub expected_errors: Vec<i64>,
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads settings, samples and expected errors from one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    document: InputDocument,
}

impl JsonFileLoader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input: {}", path.display()))?;
        let document: InputDocument = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse input: {}", path.display()))?;
        debug!(
            series = document.series.len(),
            expected = document.expected_errors.len(),
            "Loaded input document"
        );
        Ok(Self { document })
    }
}

impl DataLoader for JsonFileLoader {
    fn load_settings(&self) -> tsod_core::Result<BTreeMap<String, String>> {
        Ok(self
            .document
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), scalar(v)))
            .collect())
    }

    fn load_raw_samples(&self) -> tsod_core::Result<RawSamples> {
        Ok(self
            .document
            .series
            .iter()
            .map(|(name, points)| {
                let raw = points.iter().map(|(ts, v)| (ts.clone(), scalar(v))).collect();
                (name.clone(), raw)
            })
            .collect())
    }

    fn load_expected_errors(&self) -> tsod_core::Result<Vec<i64>> {
        Ok(self.document.expected_errors.clone())
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from a TOML file.
///
/// ```toml
/// [settings]
/// resolution = 300
/// forecast_periods = 12
/// threads = "sync"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Detector settings, same keys as the input file's `settings` object
    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,
}

impl CliConfig {
    /// Load config from the given path. Returns defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        let config_path = PathBuf::from(path);
        debug!(?config_path, "Loading config");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Settings as plain strings, ready for `DetectorConfig::with_settings`.
    pub fn settings(&self) -> BTreeMap<String, String> {
        self.settings
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

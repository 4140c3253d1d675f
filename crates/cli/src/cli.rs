use std::collections::BTreeMap;

use clap::{Parser, ValueEnum};

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Time-series outlier detection.
///
/// Reads series from a JSON input file, runs every built-in analyzer over
/// them and prints the outliers the analyzers agree on.
#[derive(Parser, Debug)]
#[command(name = "tsod", version, about)]
pub struct CliArgs {
    /// Input JSON file with `series`, optional `settings` and `expected_errors`
    #[arg(long, short)]
    pub input: String,

    /// Path to a TOML config file with a `[settings]` table
    #[arg(long, env = "TSOD_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,

    /// Minimum consensus score for a timestamp to be reported
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Worker threads: a number, `auto` (one per analyzer) or `sync`
    #[arg(long)]
    pub threads: Option<String>,

    /// Run analyzers sequentially on the main thread
    #[arg(long, conflicts_with = "threads")]
    pub sequential: bool,

    /// Target bucket width in seconds
    #[arg(long)]
    pub resolution: Option<i64>,

    /// Number of trailing points to classify
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Value normalization: none, log, log10, log1p, sqrt or auto
    #[arg(long)]
    pub normalization: Option<String>,

    /// Seconds to wait for analyzers before giving up on them
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl CliArgs {
    /// Command-line overrides expressed as detector settings.
    pub fn setting_overrides(&self) -> BTreeMap<String, String> {
        let mut settings = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                settings.insert(key.to_string(), v);
            }
        };
        put("min_score", self.min_score.map(|v| v.to_string()));
        put("resolution", self.resolution.map(|v| v.to_string()));
        put("forecast_horizon", self.horizon.map(|v| v.to_string()));
        put("normalization", self.normalization.clone());
        put("deadline_seconds", self.deadline.map(|v| v.to_string()));
        if self.sequential {
            put("threads", Some("sync".to_string()));
        } else {
            put("threads", self.threads.clone());
        }
        settings
    }
}

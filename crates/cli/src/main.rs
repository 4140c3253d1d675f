mod cli;
mod config;
mod loader;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tsod_compute::DetectionEngine;
use tsod_core::config::load_dotenv;
use tsod_core::{DataLoader, DetectorConfig};

use crate::cli::{CliArgs, OutputFormat};
use crate::config::CliConfig;
use crate::loader::JsonFileLoader;

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    // Logs go to stderr so the report on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli_config = CliConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let loader = JsonFileLoader::open(&args.input)?;

    // Precedence: environment < config file < input file < command line.
    let config = DetectorConfig::from_env()
        .and_then(|c| c.with_settings(&cli_config.settings()))
        .and_then(|c| c.with_settings(&loader.load_settings()?))
        .and_then(|c| c.with_settings(&args.setting_overrides()))
        .context("invalid detector settings")?;

    let mut engine = DetectionEngine::load_with_config(&loader, config).context("failed to prepare series")?;
    engine.register_default_analyzers();
    engine.analyze();
    let reported = engine.validate().outliers.len();
    info!("{} outliers reported", reported);

    let report = engine.report();
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).context("failed to serialize report")?,
        OutputFormat::Text => render::render_text(&report),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("failed to write report: {}", path))?;
            info!("Report written to {}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

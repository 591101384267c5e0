mod config;
mod data;
mod monitoring;
mod output;
mod pipeline;
mod strategies;

use anyhow::{Context, Result};
use chrono::Utc;
use config::{Config, EnvConfig};
use monitoring::logger::RunLogger;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Snowday run starting...");

    // Load configuration
    let env_config = EnvConfig::load();
    let mut config = Config::load_or_default(&env_config.config_path)?;
    config.apply_env(&env_config);

    tracing::info!("Resort: {}", config.resort.name);
    tracing::info!("Forecast horizon: {} days", config.forecast.horizon_days);
    tracing::info!("Output: {}", config.system.output_path);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.system.request_timeout_secs))
        .user_agent("SnowdayBot/1.0")
        .build()
        .context("Failed to build HTTP client")?;

    let (acquired, sources) = pipeline::acquire(&config, http).await;
    let artifact = pipeline::assemble(acquired, sources, &config, Utc::now());

    tracing::info!(
        "Next: {} (confidence: {})",
        artifact.next.label,
        artifact.next.confidence
    );
    for reason in &artifact.next.reasons {
        tracing::debug!("  - {}", reason);
    }

    // The only failure that ends the run with an error
    if let Err(e) = output::persistence::write_artifact(&config.system.output_path, &artifact) {
        tracing::error!("Failed to write output: {:#}", e);
        return Err(e);
    }

    if config.monitoring.csv_logging {
        let logged = RunLogger::new(config.monitoring.csv_log_path.clone())
            .and_then(|logger| logger.log_run(&artifact));
        if let Err(e) = logged {
            tracing::warn!("Run history not recorded: {:#}", e);
        }
    }

    tracing::info!("✅ Run complete");
    Ok(())
}

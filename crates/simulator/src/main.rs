//! Handoff - Producer-consumer simulation entry point

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use handoff_core::application::Simulation;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, OutputFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "handoff=info,handoff_core=info";

fn init_logging() -> Result<()> {
    let log_format = std::env::var("HANDOFF_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    // Logs go to stderr so stdout carries only the report
    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    init_logging()?;
    info!("Handoff v{} starting...", VERSION);

    // 2. Resolve configuration
    let config = cli.to_config().context("Invalid simulation configuration")?;

    // 3. Run simulation
    let report = Simulation::new(config)
        .run()
        .await
        .context("Simulation failed")?;

    // 4. Report (a shortfall is reported, not a crash)
    if !report.is_complete() {
        warn!(
            shortfall = report.shortfall(),
            "Not every expected message was transferred"
        );
    }

    match cli.output {
        OutputFormat::Json => println!("{}", output::render_json(&report)?),
        OutputFormat::Text => print!("{}", output::render_text(&report)),
    }

    info!("Shutdown complete.");
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use riemann_output::{OutputConfig, RawEvent, RiemannOutput};
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Forward newline-delimited JSON events from stdin to Riemann
#[derive(Parser)]
#[command(name = "riemann-output", version)]
struct Cli {
    /// TOML config file (defaults to /etc/riemann-output/config.toml)
    #[arg(long, env = "RIEMANN_OUTPUT_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "riemann_output=info,riemann_client=info".into());

    // Logs go to stderr, stdin carries the events.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let config = match cli.config {
        Some(path) => OutputConfig::load_from(&path),
        None => OutputConfig::load(),
    }
    .context("Failed to load configuration")?;

    tracing::info!("Starting riemann output with config: {:?}", config);

    let output = RiemannOutput::configure(&config).context("Invalid riemann output setup")?;

    let stdin = std::io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match RawEvent::from_json_str(&line) {
            Ok(event) => output.receive(&event),
            Err(e) => tracing::warn!(line = index + 1, "Skipping input: {}", e),
        }
    }

    let stats = output.stats();
    tracing::info!(
        received = stats.received,
        delivered = stats.delivered,
        failed = stats.failed,
        "Input exhausted, shutting down"
    );

    Ok(())
}

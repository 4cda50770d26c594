//! Job Radar — Binary Entrypoint
//! Loads config, wires sources and channels, and runs the monitor once or
//! on an interval.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_radar::config::{MonitorConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use job_radar::monitor::Monitor;
use job_radar::notify::Dispatcher;

#[derive(Debug, Parser)]
#[command(name = "job-radar", about = "Role-based job posting monitor")]
struct Cli {
    /// Run one check cycle and exit (for cron / CI schedules).
    #[arg(long)]
    once: bool,
    /// Check interval in minutes for continuous mode.
    #[arg(long, default_value_t = 30)]
    interval_mins: u64,
    /// Config path; overrides $JOB_RADAR_CONFIG and the default.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere. Channel credentials
    // (Telegram, SMTP) come from the environment, never from config.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| {
        std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });
    let cfg = MonitorConfig::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    tracing::info!(
        sources = cfg.sources.len(),
        state = %cfg.state_path.display(),
        "config loaded"
    );

    let mut monitor = Monitor::new(cfg, Dispatcher::from_env());

    if cli.once {
        let summary = monitor.run_once().await?;
        // One-shot runs flush immediately; there is no later tick to
        // catch the send window.
        monitor.flush_digest().await;
        monitor.flush_weekly().await;
        tracing::info!(?summary, "one-shot run finished");
        return Ok(());
    }

    let interval = std::time::Duration::from_secs(cli.interval_mins.max(1) * 60);
    tracing::info!(interval_mins = cli.interval_mins, "starting continuous monitoring");
    monitor.run_continuous(interval).await
}

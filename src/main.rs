// src/main.rs
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use subhunter::cli::Cli;
use subhunter::config::Config;
use subhunter::output::{self, human::HumanSummary};
use subhunter::progress::{BarObserver, LogObserver, ProgressReporter};
use subhunter::scanner::Scanner;
use tracing_subscriber::EnvFilter;

/// How often progress is logged when there is no progress bar
const LOG_PROGRESS_EVERY: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file if given
    let file_config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Initialize logging
    let log_level = cli.log_level().unwrap_or(&file_config.logging.level);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.scan_config(&file_config);
    tracing::info!(
        "Target: {} | threads: {} | timeout: {:?}",
        config.domain,
        config.threads,
        config.timeout
    );

    // Progress bar on a terminal, periodic log lines otherwise
    let show_bar = cli.should_show_progress() && is_terminal::is_terminal(std::io::stderr());
    let bar = show_bar.then(|| Arc::new(BarObserver::new()));
    let mut progress = ProgressReporter::new();
    let mut ticker = None;

    match &bar {
        Some(bar) => progress = progress.with_observer(bar.clone()),
        None if !cli.quiet => {
            progress = progress.with_observer(Arc::new(LogObserver));
            ticker = Some(progress.spawn_ticker(LOG_PROGRESS_EVERY));
        }
        None => {}
    }

    let scanner = Scanner::with_defaults(&config, progress)?;

    // Ctrl-C stops the scan but still reports what was found
    let cancel = scanner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current phase...");
            cancel.cancel();
        }
    });

    let report = scanner.run_scan(config).await?;

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    if let Some(bar) = &bar {
        bar.finish();
    }

    HumanSummary::new().print(&report)?;

    // A failed export still leaves the summary on screen
    match output::export(
        &report,
        cli.output_format(),
        cli.file.as_deref(),
        Path::new("."),
    ) {
        Ok(path) => println!("Results saved to: {}", path.display()),
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

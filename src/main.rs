mod cli;
mod config;
mod engine;
mod error;
mod model;
mod orchestrator;
mod render;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. The returned guard flushes the log file on drop.
fn init_logging(args: &cli::Cli) -> Result<Option<WorkerGuard>> {
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        return Ok(Some(guard));
    }

    // The TUI owns the terminal; without a log file there is nowhere safe to write.
    if !args.wants_tui() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let _log_guard = init_logging(&args)?;
    cli::run(args).await
}

//! ped - persistent-rope text editing engine
//!
//! Entry point: loads configuration, sets up logging and replays a
//! keystroke script against a fresh buffer.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ped::commands::ReplayCommand;
use ped::core::{PedConfig, APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(name = "ped", version, about = "Replay keystrokes through a persistent-rope editor")]
struct Cli {
    /// Keystroke script to replay (reads stdin when omitted)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the number of recorded versions next to each line
    #[arg(long)]
    history: bool,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PedConfig::load_from(path).await?,
        None => PedConfig::load().await?,
    };

    // Initialize logging; RUST_LOG overrides the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(config.logging.with_file)
        .with_line_number(config.logging.with_line_number)
        .init();

    info!("{} v{} starting...", APP_NAME, VERSION);

    let command = ReplayCommand { script: cli.script };
    let report = command.execute(&config.editor).await?;

    for (line, versions) in report.lines.iter().zip(&report.versions) {
        if cli.history {
            println!("{versions}\t{line}");
        } else {
            println!("{line}");
        }
    }

    if report.rejected > 0 {
        info!("{} command(s) were rejected", report.rejected);
    }

    Ok(())
}

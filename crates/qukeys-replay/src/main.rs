mod script;

use anyhow::{Context, Result};
use clap::Parser;
use qukeys_core::config::{load_config, QukeysConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replay timed key presses through the qukeys engine and print every report sent.
#[derive(Debug, Parser)]
#[command(name = "qukeys-replay", version, about)]
struct Cli {
    /// Replay script (JSON): keymap, optional qukeys config, steps.
    script: PathBuf,

    /// Qukeys config file; overrides the script's inline config.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read {}", cli.script.display()))?;
    let script = script::Script::parse(&text)?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => script.qukeys.clone().unwrap_or_else(QukeysConfig::default),
    };
    info!(
        "Replaying {} steps with {} qukeys",
        script.steps.len(),
        config.qukeys.len()
    );

    for (t, report) in script::replay(&script, &config)? {
        println!("{}", script::format_report(t, &report));
    }
    Ok(())
}

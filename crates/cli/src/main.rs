//! `murmur`: replays a file of social-feed commands and writes the transcript.
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use murmur_cli::transcript;

#[derive(Debug, Parser)]
#[command(name = "murmur", version)]
#[command(about = "Replay social-feed commands and write the resulting transcript", long_about = None)]
struct Cli {
    /// File with one command per line
    input: PathBuf,

    /// File the transcript is written to (truncated)
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stats = transcript::run(&cli.input, &cli.output)?;
    tracing::info!(
        commands = stats.commands,
        rejected = stats.rejected,
        skipped = stats.skipped,
        output = %cli.output.display(),
        "transcript written"
    );
    Ok(())
}

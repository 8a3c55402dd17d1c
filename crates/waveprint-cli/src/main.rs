//! Waveprint CLI - audio fingerprint extraction and comparison.
//!
//! Features:
//! - Fingerprint extraction from raw PCM and WAV files
//! - Pairwise fingerprint comparison with alignment reporting
//! - Text or JSON output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Waveprint CLI - audio fingerprint toolkit
#[derive(Parser)]
#[command(name = "waveprint-cli")]
#[command(version)]
#[command(about = "Audio fingerprint extraction and comparison", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and print fingerprints from audio files
    Fingerprint {
        /// Input files (headerless little-endian 16-bit mono PCM)
        inputs: Vec<PathBuf>,

        /// Treat inputs as WAV files instead of raw PCM
        #[arg(long)]
        wav: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the fingerprints of two audio files
    Compare {
        /// First input file
        first: PathBuf,

        /// Second input file
        second: PathBuf,

        /// Treat inputs as WAV files instead of raw PCM
        #[arg(long)]
        wav: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(level).init();

    match cli.command {
        Commands::Fingerprint { inputs, wav, json } => commands::fingerprint(&inputs, wav, json),
        Commands::Compare {
            first,
            second,
            wav,
            json,
        } => commands::compare(&first, &second, wav, json),
    }
}

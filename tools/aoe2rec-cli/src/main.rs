//! aoe2rec CLI - Recorded-game decoder
//!
//! # Commands
//!
//! - `aoe2rec inspect` - Summarize a single replay
//! - `aoe2rec export` - Convert a single replay to JSON Lines
//! - `aoe2rec preprocess` - Convert a directory of replays in parallel
//!
//! # Usage
//!
//! ```bash
//! # What is in this file?
//! aoe2rec inspect ranked.aoe2record
//!
//! # One JSON object per event
//! aoe2rec export ranked.aoe2record -o ranked.jsonl
//!
//! # Whole directory, skipping anything that is not a replay
//! aoe2rec preprocess --input recs/ --output out/ --jobs 8
//! ```
//!
//! # Config (aoe2rec.toml)
//!
//! ```toml
//! [parse]
//! max_logical_bytes = 268435456
//! max_events = 10000000
//!
//! [preprocess]
//! extensions = ["mgz", "aoe2record", "rec"]
//! layout = "events"
//! jobs = 8
//! ```

mod config;
mod export;
mod inspect;
mod output;
mod preprocess;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// aoe2rec - Recorded-game decoder
#[derive(Parser)]
#[command(name = "aoe2rec")]
#[command(about = "Decode recorded-game replays into JSON Lines")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a replay
    Inspect(inspect::InspectArgs),

    /// Write a replay as JSON Lines
    Export(export::ExportArgs),

    /// Convert every replay under a directory
    Preprocess(preprocess::PreprocessArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Export(args) => export::execute(args),
        Commands::Preprocess(args) => preprocess::execute(args),
    }
}

/// Logs go to stderr so exported JSON on stdout stays clean
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

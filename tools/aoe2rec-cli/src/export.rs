//! Export command - write a single replay as JSON Lines

use anyhow::{Context, Result};
use aoe2rec_core::ReplayParser;
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use crate::config::Config;
use crate::output::{Layout, write_jsonl};

/// Arguments for the export command
#[derive(Args)]
pub struct ExportArgs {
    /// Replay file (.mgz, .aoe2record, ...)
    pub file: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// One line per event, or one line for the whole file
    #[arg(long, value_enum, default_value_t = Layout::Events)]
    pub layout: Layout,

    /// Config file (defaults to ./aoe2rec.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the export command
pub fn execute(args: ExportArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let replay = ReplayParser::new(config.parse)
        .parse_path(&args.file)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let lines = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_jsonl(BufWriter::new(file), &replay, args.layout)
                .with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => write_jsonl(BufWriter::new(io::stdout().lock()), &replay, args.layout)
            .context("Failed to write to stdout")?,
    };

    tracing::info!(
        "Exported {} ({} lines, {} events)",
        args.file.display(),
        lines,
        replay.events().len()
    );
    Ok(())
}

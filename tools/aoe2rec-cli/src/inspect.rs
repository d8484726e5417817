//! Inspect command - summarize a single replay

use anyhow::{Context, Result};
use aoe2rec_core::{ParsedReplay, ReplayParser};
use clap::Args;
use std::path::PathBuf;

use crate::config::Config;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Replay file (.mgz, .aoe2record, ...)
    pub file: PathBuf,

    /// Print the full decoded replay as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to ./aoe2rec.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let parsed = ReplayParser::new(config.parse)
        .parse_path_detailed(&args.file)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print!("{}", summary(&args.file.display().to_string(), &parsed));
    }
    Ok(())
}

/// Human-readable summary
fn summary(name: &str, parsed: &ParsedReplay) -> String {
    let replay = &parsed.replay;
    let mut out = String::new();
    out.push_str(&format!("=== {name} ===\n"));
    out.push_str(&format!("  Container: {}\n", replay.kind()));
    out.push_str(&format!(
        "  Transport: {} ({} bytes decoded)\n",
        parsed.transport, parsed.logical_len
    ));

    if let Some(header) = replay.header() {
        out.push_str(&format!("  Game version: {}\n", header.game_version));
        out.push_str(&format!(
            "  Map: {}x{}\n",
            header.map.width, header.map.height
        ));
        out.push_str(&format!("  Players: {}\n", header.players.len()));
        for player in &header.players {
            out.push_str(&format!(
                "    {} (civ {}, color {})\n",
                player.name, player.civ_id, player.color_id
            ));
        }
    }
    if let Some(checksums) = &parsed.checksums {
        out.push_str(&format!(
            "  Checksums: {} verified, {} unchecked, {} skipped\n",
            checksums.verified, checksums.unchecked, checksums.skipped
        ));
    }

    let events = replay.events();
    out.push_str(&format!("  Events: {}\n", events.len()));
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        out.push_str(&format!(
            "  Timestamps: {} .. {} ms\n",
            first.timestamp, last.timestamp
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoe2rec_core::{
        ChecksumSummary, Event, HeaderMetadata, MapSize, PlayerInfo, RecordedGame, Replay,
        Transport,
    };

    #[test]
    fn test_summary_event_stream() {
        let parsed = ParsedReplay {
            replay: Replay::Events(vec![
                Event::new(1000, "Alice", "move"),
                Event::new(2000, "Bob", "attack"),
            ]),
            transport: Transport::Gzip,
            logical_len: 34,
            checksums: None,
        };
        let text = summary("game.mgz", &parsed);
        assert!(text.contains("Container: event stream"));
        assert!(text.contains("Transport: gzip (34 bytes decoded)"));
        assert!(text.contains("Events: 2"));
        assert!(text.contains("Timestamps: 1000 .. 2000 ms"));
        assert!(!text.contains("Players"));
    }

    #[test]
    fn test_summary_recorded_game() {
        let parsed = ParsedReplay {
            replay: Replay::Recorded(RecordedGame {
                header: HeaderMetadata {
                    game_version: "VER 9.4".into(),
                    map: MapSize {
                        width: 120,
                        height: 100,
                    },
                    players: vec![PlayerInfo {
                        name: "Alice".into(),
                        civ_id: 3,
                        color_id: 1,
                    }],
                },
                events: vec![],
            }),
            transport: Transport::Plain,
            logical_len: 60,
            checksums: Some(ChecksumSummary {
                verified: 2,
                unchecked: 1,
                skipped: 0,
            }),
        };
        let text = summary("rec.aoe2record", &parsed);
        assert!(text.contains("Map: 120x100"));
        assert!(text.contains("Alice (civ 3, color 1)"));
        assert!(text.contains("Checksums: 2 verified, 1 unchecked, 0 skipped"));
        assert!(text.contains("Events: 0"));
        assert!(!text.contains("Timestamps"));
    }
}

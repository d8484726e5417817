//! JSON Lines output

use std::io::Write;

use anyhow::Result;
use aoe2rec_core::{ContainerKind, Event, HeaderMetadata, Replay};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Shape of the exported JSON Lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One line per event
    #[default]
    Events,
    /// One line per file, holding the header and all events
    Document,
}

/// Whole-file record written by [`Layout::Document`]
#[derive(Debug, Serialize)]
struct Document<'a> {
    kind: ContainerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<&'a HeaderMetadata>,
    events: &'a [Event],
}

/// Write `replay` as JSON Lines, returning the number of lines written
pub fn write_jsonl<W: Write>(mut writer: W, replay: &Replay, layout: Layout) -> Result<usize> {
    let lines = match layout {
        Layout::Events => {
            for event in replay.events() {
                serde_json::to_writer(&mut writer, event)?;
                writer.write_all(b"\n")?;
            }
            replay.events().len()
        }
        Layout::Document => {
            let document = Document {
                kind: replay.kind(),
                header: replay.header(),
                events: replay.events(),
            };
            serde_json::to_writer(&mut writer, &document)?;
            writer.write_all(b"\n")?;
            1
        }
    };
    writer.flush()?;
    Ok(lines)
}

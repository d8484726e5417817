//! Core types for decoded replays
//!
//! These are the values handed to callers. They serialize with serde into
//! the JSON Lines records consumed downstream.

use serde::{Deserialize, Serialize};

/// One decoded game-action record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds since game start. Monotonic by convention, not enforced.
    pub timestamp: u32,
    /// Acting player; may be empty
    pub player: String,
    /// Action label
    pub event: String,
}

impl Event {
    pub fn new(timestamp: u32, player: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            timestamp,
            player: player.into(),
            event: event.into(),
        }
    }
}

/// Map dimensions in tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

/// Player record from the rich header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub civ_id: u8,
    pub color_id: u8,
}

/// Game metadata from the rich header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMetadata {
    pub game_version: String,
    pub map: MapSize,
    pub players: Vec<PlayerInfo>,
}

/// String block category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Random map script strings
    Rms,
    /// Any other string block
    Other,
}

impl BlockKind {
    /// Wire tag for this kind
    pub fn tag(self) -> u8 {
        match self {
            BlockKind::Rms => 0,
            BlockKind::Other => 1,
        }
    }

    /// Kind for a wire tag, if known
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(BlockKind::Rms),
            1 => Some(BlockKind::Other),
            _ => None,
        }
    }
}

/// A CRC-32 checksum paired with the raw payload it covers.
///
/// An `expected_crc` of zero means "not checked".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub expected_crc: u32,
    pub payload: Vec<u8>,
}

impl ChecksumEntry {
    /// Entry whose checksum is computed from `payload`
    pub fn sealed(payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        Self {
            expected_crc: crc32fast::hash(&payload),
            payload,
        }
    }

    /// Entry that skips verification
    pub fn unchecked(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            expected_crc: 0,
            payload: payload.into(),
        }
    }
}

/// Entry wire tag for a checksum/payload pair
pub const ENTRY_TAG_CHECKSUM: u8 = 1;

/// One entry of a string block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEntry {
    /// Checksum/payload pair
    Checksum(ChecksumEntry),
    /// Padding or forward-compatible entry; carried, never validated
    Opaque { tag: u8, data: Vec<u8> },
}

/// A block of header strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBlock {
    pub kind: BlockKind,
    pub entries: Vec<BlockEntry>,
}

/// Rich container contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedGame {
    pub header: HeaderMetadata,
    pub events: Vec<Event>,
}

/// Result of a successful parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Replay {
    /// Rich container: header metadata plus events
    Recorded(RecordedGame),
    /// Simple container: events only
    Events(Vec<Event>),
}

impl Replay {
    /// Events in file order
    pub fn events(&self) -> &[Event] {
        match self {
            Replay::Recorded(game) => &game.events,
            Replay::Events(events) => events,
        }
    }

    /// Header metadata, for the rich container
    pub fn header(&self) -> Option<&HeaderMetadata> {
        match self {
            Replay::Recorded(game) => Some(&game.header),
            Replay::Events(_) => None,
        }
    }

    /// Take ownership of the events
    pub fn into_events(self) -> Vec<Event> {
        match self {
            Replay::Recorded(game) => game.events,
            Replay::Events(events) => events,
        }
    }

    /// Container variant name
    pub fn kind(&self) -> ContainerKind {
        match self {
            Replay::Recorded(_) => ContainerKind::RichHeader,
            Replay::Events(_) => ContainerKind::EventStream,
        }
    }
}

/// The two container variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Bare `u32` count followed by events
    EventStream,
    /// `RHDR` header followed by an event stream
    RichHeader,
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::EventStream => f.write_str("event stream"),
            ContainerKind::RichHeader => f.write_str("rich header"),
        }
    }
}

//! aoe2rec Core - Recorded-game decoder
//!
//! Decodes recorded-game files into an ordered list of game events, with
//! optional header metadata.
//!
//! # Architecture
//!
//! - [`transport`] - gzip detection and decompression
//! - [`events`] - the simple event-stream container
//! - [`header`] - the rich `RHDR` container and its string blocks
//! - [`checksum`] - CRC-32 validation of string block entries
//! - [`text`] - total decoding of length-prefixed text
//! - [`parser`] - [`ReplayParser`] and [`parse`], tying the stages together
//! - [`writer`] - [`ReplayWriter`], the inverse of the decoders
//!
//! ```no_run
//! let replay = aoe2rec_core::parse("game.aoe2record")?;
//! for event in replay.events() {
//!     println!("{} {} {}", event.timestamp, event.player, event.event);
//! }
//! # Ok::<(), aoe2rec_core::ReplayError>(())
//! ```

pub mod checksum;
pub mod cursor;
pub mod error;
pub mod events;
pub mod header;
pub mod options;
pub mod parser;
pub mod text;
pub mod transport;
pub mod types;
pub mod writer;

pub use checksum::{ChecksumSummary, validate_checksums};
pub use error::{FailureClass, Field, ReplayError, Result};
pub use events::{MIN_EVENT_SIZE, decode_events};
pub use header::{HEADER_MAGIC, HEADER_VERSION, MIN_ENTRY_SIZE, MIN_PLAYER_SIZE, RichHeader};
pub use options::ParseOptions;
pub use parser::{ParsedReplay, ReplayParser, parse};
pub use text::{DecodedText, TextEncoding, decode_text};
pub use transport::{LogicalBytes, Transport};
pub use types::{
    BlockEntry, BlockKind, ChecksumEntry, ContainerKind, Event, HeaderMetadata, MapSize,
    PlayerInfo, RecordedGame, Replay, StringBlock,
};
pub use writer::{ReplayWriter, encode_events, write_gzip};

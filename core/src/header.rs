//! Rich header container decoding
//!
//! ```text
//! [4]  magic "RHDR"
//! [1]  container version
//! [1]  game_version_len, [n] game_version
//! [4]  map width
//! [4]  map height
//! [1]  player_count
//!      repeat: [1] name_len, [n] name, [1] civ_id, [1] color_id
//! [1]  block_count
//!      repeat: [1] kind, [2] entry_count
//!              repeat: [1] tag
//!                      tag 1: [4] crc, [2] len, [n] payload
//!                      other: [2] len, [n] opaque bytes
//! [..] event stream
//! ```

use crate::cursor::ByteCursor;
use crate::error::{Field, ReplayError, Result};
use crate::text::decode_string;
use crate::types::{
    BlockEntry, BlockKind, ChecksumEntry, ENTRY_TAG_CHECKSUM, HeaderMetadata, MapSize, PlayerInfo,
    StringBlock,
};

/// Magic bytes opening a rich header container
pub const HEADER_MAGIC: [u8; 4] = *b"RHDR";

/// The only container version understood
pub const HEADER_VERSION: u8 = 1;

/// Smallest player record: empty name plus civ and color ids
pub const MIN_PLAYER_SIZE: u64 = 1 + 1 + 1;

/// Smallest block entry: tag plus an empty opaque payload
pub const MIN_ENTRY_SIZE: u64 = 1 + 2;

/// Smallest string block: kind plus an entry count of zero
const MIN_BLOCK_SIZE: u64 = 1 + 2;

/// Decoded rich header: metadata plus the string blocks still to be validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichHeader {
    pub metadata: HeaderMetadata,
    pub blocks: Vec<StringBlock>,
}

/// Whether logical bytes open with the rich header magic
pub fn is_rich_header(data: &[u8]) -> bool {
    data.starts_with(&HEADER_MAGIC)
}

/// Decode the rich header, leaving the cursor at the start of the event stream
pub fn decode_header(cursor: &mut ByteCursor<'_>) -> Result<RichHeader> {
    let magic = cursor.take(HEADER_MAGIC.len(), Field::Magic)?;
    if magic != HEADER_MAGIC {
        return Err(ReplayError::unsupported(format!(
            "header magic {magic:02x?} is not RHDR"
        )));
    }

    let version = cursor.read_u8(Field::Version)?;
    if version != HEADER_VERSION {
        return Err(ReplayError::unsupported(format!(
            "container version {version} (expected {HEADER_VERSION})"
        )));
    }

    let game_version =
        decode_string(cursor.read_prefixed(Field::GameVersionLength, Field::GameVersion)?);
    let map = MapSize {
        width: cursor.read_u32(Field::MapWidth)?,
        height: cursor.read_u32(Field::MapHeight)?,
    };
    let players = decode_players(cursor)?;
    let blocks = decode_blocks(cursor)?;
    cursor.set_record(None);

    tracing::debug!(
        game_version = %game_version,
        players = players.len(),
        blocks = blocks.len(),
        "decoded rich header"
    );

    Ok(RichHeader {
        metadata: HeaderMetadata {
            game_version,
            map,
            players,
        },
        blocks,
    })
}

fn decode_players(cursor: &mut ByteCursor<'_>) -> Result<Vec<PlayerInfo>> {
    let count = cursor.read_u8(Field::PlayerCount)?;
    check_fits("player", u64::from(count), MIN_PLAYER_SIZE, cursor)?;

    let mut players = Vec::with_capacity(usize::from(count));
    for index in 0..count {
        cursor.set_record(Some(u64::from(index)));
        let name = cursor.read_prefixed(Field::PlayerRecordNameLength, Field::PlayerRecordName)?;
        players.push(PlayerInfo {
            name: decode_string(name),
            civ_id: cursor.read_u8(Field::CivilizationId)?,
            color_id: cursor.read_u8(Field::ColorId)?,
        });
    }
    cursor.set_record(None);
    Ok(players)
}

fn decode_blocks(cursor: &mut ByteCursor<'_>) -> Result<Vec<StringBlock>> {
    let count = cursor.read_u8(Field::BlockCount)?;
    check_fits("string block", u64::from(count), MIN_BLOCK_SIZE, cursor)?;

    let mut blocks = Vec::with_capacity(usize::from(count));
    for index in 0..count {
        cursor.set_record(Some(u64::from(index)));
        blocks.push(decode_block(cursor, u64::from(index))?);
    }
    cursor.set_record(None);
    Ok(blocks)
}

fn decode_block(cursor: &mut ByteCursor<'_>, index: u64) -> Result<StringBlock> {
    let tag = cursor.read_u8(Field::BlockKind)?;
    let kind = BlockKind::from_tag(tag).ok_or_else(|| ReplayError::CorruptInput {
        field: Field::BlockKind,
        index: Some(index),
        detail: format!("unknown block kind {tag}"),
    })?;

    let count = cursor.read_u16(Field::EntryCount)?;
    check_fits("string block entry", u64::from(count), MIN_ENTRY_SIZE, cursor)?;

    let mut entries = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        entries.push(decode_entry(cursor)?);
    }
    Ok(StringBlock { kind, entries })
}

fn decode_entry(cursor: &mut ByteCursor<'_>) -> Result<BlockEntry> {
    let tag = cursor.read_u8(Field::EntryTag)?;
    if tag == ENTRY_TAG_CHECKSUM {
        let expected_crc = cursor.read_u32(Field::EntryChecksum)?;
        let payload = read_entry_payload(cursor)?;
        Ok(BlockEntry::Checksum(ChecksumEntry {
            expected_crc,
            payload,
        }))
    } else {
        let data = read_entry_payload(cursor)?;
        Ok(BlockEntry::Opaque { tag, data })
    }
}

fn read_entry_payload(cursor: &mut ByteCursor<'_>) -> Result<Vec<u8>> {
    let len = cursor.read_u16(Field::EntryLength)?;
    Ok(cursor.take(usize::from(len), Field::EntryPayload)?.to_vec())
}

fn check_fits(what: &str, count: u64, min_size: u64, cursor: &ByteCursor<'_>) -> Result<()> {
    let minimum = count * min_size;
    let remaining = cursor.remaining() as u64;
    if minimum > remaining {
        return Err(ReplayError::unsupported(format!(
            "declared {count} {what} records need at least {minimum} bytes, {remaining} remain"
        )));
    }
    Ok(())
}

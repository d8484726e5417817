//! Replay encoder
//!
//! Writes both container variants. Used to build fixtures and to re-encode
//! decoded replays; decoding an encoded replay yields the same values.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{Field, ReplayError, Result};
use crate::header::{HEADER_MAGIC, HEADER_VERSION};
use crate::types::{BlockEntry, ENTRY_TAG_CHECKSUM, Event, HeaderMetadata, StringBlock};

/// Writer for both container variants
pub struct ReplayWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReplayWriter<W> {
    /// Create a new replay writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the simple container: event count followed by events
    pub fn write_events(&mut self, events: &[Event]) -> Result<()> {
        let count = u32::try_from(events.len()).map_err(|_| ReplayError::FieldTooLong {
            field: Field::EventCount,
            len: events.len(),
            max: u32::MAX as usize,
        })?;
        self.writer.write_u32::<LittleEndian>(count)?;

        for event in events {
            self.writer.write_u32::<LittleEndian>(event.timestamp)?;
            self.write_text(Field::PlayerName, &event.player)?;
            self.write_text(Field::EventName, &event.event)?;
        }
        Ok(())
    }

    /// Write the rich container: header, string blocks, then the event stream
    pub fn write_recorded(
        &mut self,
        header: &HeaderMetadata,
        blocks: &[StringBlock],
        events: &[Event],
    ) -> Result<()> {
        self.writer.write_all(&HEADER_MAGIC)?;
        self.writer.write_u8(HEADER_VERSION)?;
        self.write_text(Field::GameVersion, &header.game_version)?;
        self.writer.write_u32::<LittleEndian>(header.map.width)?;
        self.writer.write_u32::<LittleEndian>(header.map.height)?;

        self.writer
            .write_u8(count_u8(Field::PlayerCount, header.players.len())?)?;
        for player in &header.players {
            self.write_text(Field::PlayerRecordName, &player.name)?;
            self.writer.write_u8(player.civ_id)?;
            self.writer.write_u8(player.color_id)?;
        }

        self.writer
            .write_u8(count_u8(Field::BlockCount, blocks.len())?)?;
        for block in blocks {
            self.write_block(block)?;
        }

        self.write_events(events)
    }

    fn write_block(&mut self, block: &StringBlock) -> Result<()> {
        self.writer.write_u8(block.kind.tag())?;
        let count = u16::try_from(block.entries.len()).map_err(|_| ReplayError::FieldTooLong {
            field: Field::EntryCount,
            len: block.entries.len(),
            max: u16::MAX as usize,
        })?;
        self.writer.write_u16::<LittleEndian>(count)?;

        for entry in &block.entries {
            match entry {
                BlockEntry::Checksum(entry) => {
                    self.writer.write_u8(ENTRY_TAG_CHECKSUM)?;
                    self.writer.write_u32::<LittleEndian>(entry.expected_crc)?;
                    self.write_entry_payload(&entry.payload)?;
                }
                BlockEntry::Opaque { tag, data } => {
                    if *tag == ENTRY_TAG_CHECKSUM {
                        return Err(ReplayError::CorruptInput {
                            field: Field::EntryTag,
                            index: None,
                            detail: format!("opaque entry cannot use tag {tag}"),
                        });
                    }
                    self.writer.write_u8(*tag)?;
                    self.write_entry_payload(data)?;
                }
            }
        }
        Ok(())
    }

    fn write_entry_payload(&mut self, payload: &[u8]) -> Result<()> {
        let len = u16::try_from(payload.len()).map_err(|_| ReplayError::FieldTooLong {
            field: Field::EntryPayload,
            len: payload.len(),
            max: u16::MAX as usize,
        })?;
        self.writer.write_u16::<LittleEndian>(len)?;
        self.writer.write_all(payload)?;
        Ok(())
    }

    /// Write a `u8` length prefix and UTF-8 bytes
    fn write_text(&mut self, field: Field, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        self.writer.write_u8(count_u8(field, bytes.len())?)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn count_u8(field: Field, len: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| ReplayError::FieldTooLong {
        field,
        len,
        max: u8::MAX as usize,
    })
}

/// Encode events in the simple container
pub fn encode_events(events: &[Event]) -> Result<Vec<u8>> {
    let mut writer = ReplayWriter::new(Vec::new());
    writer.write_events(events)?;
    Ok(writer.into_inner())
}

/// Gzip-wrap already encoded logical bytes into `writer`
pub fn write_gzip<W: Write>(writer: W, logical: &[u8]) -> Result<W> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    encoder.write_all(logical)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockKind, ChecksumEntry, MapSize};

    #[test]
    fn test_write_events_layout() {
        let buf = encode_events(&[Event::new(1000, "Alice", "move")]).unwrap();
        let mut expected = vec![0x01, 0x00, 0x00, 0x00, 0xE8, 0x03, 0x00, 0x00, 5];
        expected.extend_from_slice(b"Alice");
        expected.push(4);
        expected.extend_from_slice(b"move");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_write_empty() {
        assert_eq!(encode_events(&[]).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_name_too_long() {
        let err = encode_events(&[Event::new(0, "x".repeat(256), "move")]).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::FieldTooLong {
                field: Field::PlayerName,
                len: 256,
                max: 255
            }
        ));
        assert!(encode_events(&[Event::new(0, "x".repeat(255), "move")]).is_ok());
    }

    #[test]
    fn test_too_many_block_entries() {
        let header = HeaderMetadata {
            game_version: String::new(),
            map: MapSize {
                width: 0,
                height: 0,
            },
            players: vec![],
        };
        let block = StringBlock {
            kind: BlockKind::Other,
            entries: vec![BlockEntry::Checksum(ChecksumEntry::unchecked(Vec::new())); 65_536],
        };
        let mut writer = ReplayWriter::new(Vec::new());
        let err = writer.write_recorded(&header, &[block], &[]).unwrap_err();
        assert_eq!(err.field(), Some(Field::EntryCount));
    }

    #[test]
    fn test_write_gzip() {
        let logical = encode_events(&[Event::new(1, "a", "b")]).unwrap();
        let wrapped = write_gzip(Vec::new(), &logical).unwrap();
        assert_eq!(&wrapped[..2], &crate::transport::GZIP_MAGIC);
    }
}

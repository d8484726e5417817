//! Replay decoding error types

use std::fmt;
use std::io;

/// A decodable field of either container variant.
///
/// Carried by truncation and corruption errors so batch tooling can report
/// exactly which part of a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The gzip transport stream wrapping the file
    GzipStream,
    /// Declared event count (`u32`)
    EventCount,
    /// Event timestamp (`u32`)
    Timestamp,
    /// Player name length prefix (`u8`)
    PlayerLength,
    /// Player name payload
    PlayerName,
    /// Event name length prefix (`u8`)
    EventLength,
    /// Event name payload
    EventName,
    /// Rich header magic bytes
    Magic,
    /// Rich header container version
    Version,
    /// Game version length prefix
    GameVersionLength,
    /// Game version payload
    GameVersion,
    /// Map width (`u32`)
    MapWidth,
    /// Map height (`u32`)
    MapHeight,
    /// Number of player records
    PlayerCount,
    /// Player record name length prefix
    PlayerRecordNameLength,
    /// Player record name payload
    PlayerRecordName,
    /// Player civilization id
    CivilizationId,
    /// Player color id
    ColorId,
    /// Number of string blocks
    BlockCount,
    /// String block kind tag
    BlockKind,
    /// Number of entries in a string block
    EntryCount,
    /// String block entry tag
    EntryTag,
    /// Declared CRC-32 of a checksum entry
    EntryChecksum,
    /// Entry payload length prefix
    EntryLength,
    /// Entry payload
    EntryPayload,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::GzipStream => "gzip stream",
            Field::EventCount => "event count",
            Field::Timestamp => "timestamp",
            Field::PlayerLength => "player length prefix",
            Field::PlayerName => "player payload",
            Field::EventLength => "event length prefix",
            Field::EventName => "event payload",
            Field::Magic => "header magic",
            Field::Version => "container version",
            Field::GameVersionLength => "game version length prefix",
            Field::GameVersion => "game version payload",
            Field::MapWidth => "map width",
            Field::MapHeight => "map height",
            Field::PlayerCount => "player count",
            Field::PlayerRecordNameLength => "player record name length prefix",
            Field::PlayerRecordName => "player record name payload",
            Field::CivilizationId => "civilization id",
            Field::ColorId => "color id",
            Field::BlockCount => "string block count",
            Field::BlockKind => "string block kind",
            Field::EntryCount => "string block entry count",
            Field::EntryTag => "string block entry tag",
            Field::EntryChecksum => "string block entry checksum",
            Field::EntryLength => "string block entry length prefix",
            Field::EntryPayload => "string block entry payload",
        };
        f.write_str(name)
    }
}

/// How a failed parse should be treated by batch tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Not this container at all; skip the file
    Unsupported,
    /// This container, but a field is truncated, invalid or fails its checksum; skip and log
    Corrupt,
    /// The environment failed (missing file, permissions, read error)
    Io,
}

/// Errors produced while decoding or encoding a replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Input is not recognizable as a supported container
    #[error("unsupported replay format: {reason}")]
    UnsupportedFormat { reason: String },

    /// A field could not be read in full
    #[error("truncated input at {field}{}: needed {needed} bytes, {available} available", event_suffix(.index))]
    TruncatedInput {
        field: Field,
        /// Event (or record) index the field belongs to, if any
        index: Option<u64>,
        needed: u64,
        available: u64,
    },

    /// A field was read in full but holds an invalid value
    #[error("corrupt input at {field}{}: {detail}", event_suffix(.index))]
    CorruptInput {
        field: Field,
        index: Option<u64>,
        detail: String,
    },

    /// A string block payload does not match its declared CRC-32
    #[error(
        "checksum mismatch in string block {block}, entry {entry}: expected {expected:#010x}, computed {actual:#010x}"
    )]
    ChecksumMismatch {
        block: usize,
        entry: usize,
        expected: u32,
        actual: u32,
    },

    /// A value is too large for its length prefix (encoding only)
    #[error("{field} is {len} bytes long (max {max})")]
    FieldTooLong { field: Field, len: usize, max: usize },

    /// I/O failure on the underlying source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn event_suffix(index: &Option<u64>) -> String {
    match index {
        Some(i) => format!(" (record {i})"),
        None => String::new(),
    }
}

impl ReplayError {
    /// Shorthand for [`ReplayError::UnsupportedFormat`].
    pub fn unsupported(reason: impl Into<String>) -> Self {
        ReplayError::UnsupportedFormat {
            reason: reason.into(),
        }
    }

    /// Classify the failure for batch tooling.
    pub fn class(&self) -> FailureClass {
        match self {
            ReplayError::UnsupportedFormat { .. } => FailureClass::Unsupported,
            ReplayError::TruncatedInput { .. }
            | ReplayError::CorruptInput { .. }
            | ReplayError::ChecksumMismatch { .. }
            | ReplayError::FieldTooLong { .. } => FailureClass::Corrupt,
            ReplayError::Io(_) => FailureClass::Io,
        }
    }

    /// Whether batch tooling may skip the file and continue.
    pub fn is_skippable(&self) -> bool {
        !matches!(self.class(), FailureClass::Io)
    }

    /// The field named by a truncation or corruption error.
    pub fn field(&self) -> Option<Field> {
        match self {
            ReplayError::TruncatedInput { field, .. }
            | ReplayError::CorruptInput { field, .. }
            | ReplayError::FieldTooLong { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Result alias for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReplayError::TruncatedInput {
            field: Field::PlayerName,
            index: Some(0),
            needed: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "truncated input at player payload (record 0): needed 3 bytes, 2 available"
        );

        let err = ReplayError::ChecksumMismatch {
            block: 0,
            entry: 1,
            expected: 0xDEAD_BEEF,
            actual: 0x1234,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch in string block 0, entry 1: expected 0xdeadbeef, computed 0x00001234"
        );

        assert_eq!(
            ReplayError::unsupported("bad magic").to_string(),
            "unsupported replay format: bad magic"
        );
    }

    #[test]
    fn test_failure_class() {
        assert_eq!(
            ReplayError::unsupported("x").class(),
            FailureClass::Unsupported
        );
        let checksum = ReplayError::ChecksumMismatch {
            block: 0,
            entry: 0,
            expected: 1,
            actual: 2,
        };
        assert_eq!(checksum.class(), FailureClass::Corrupt);
        assert!(checksum.is_skippable());

        let io = ReplayError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.class(), FailureClass::Io);
        assert!(!io.is_skippable());
    }

    #[test]
    fn test_field_accessor() {
        let err = ReplayError::CorruptInput {
            field: Field::BlockKind,
            index: None,
            detail: "unknown kind 7".into(),
        };
        assert_eq!(err.field(), Some(Field::BlockKind));
        assert_eq!(err.to_string(), "corrupt input at string block kind: unknown kind 7");
        assert_eq!(ReplayError::unsupported("x").field(), None);
    }
}

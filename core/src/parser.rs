//! Replay parser entry points
//!
//! Ties the stages together: transport detection, container classification,
//! rich header decoding and checksum validation, then the event stream.
//! A parse either returns the complete replay or an error; no partial
//! results are ever handed out.

use std::fs::File;
use std::io::{BufRead, Read, Seek};
use std::path::Path;

use serde::Serialize;

use crate::checksum::{ChecksumSummary, validate_checksums};
use crate::cursor::ByteCursor;
use crate::error::{ReplayError, Result};
use crate::events::decode_event_stream;
use crate::header::{decode_header, is_rich_header};
use crate::options::ParseOptions;
use crate::transport::{
    LogicalBytes, Transport, decode_transport, read_logical, read_logical_buffered,
};
use crate::types::{RecordedGame, Replay};

/// A decoded replay together with how it was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedReplay {
    pub replay: Replay,
    pub transport: Transport,
    /// Size of the content after transport decoding
    pub logical_len: usize,
    /// Present for rich header containers
    pub checksums: Option<ChecksumSummary>,
}

/// Replay parser with fixed limits
#[derive(Debug, Clone, Default)]
pub struct ReplayParser {
    options: ParseOptions,
}

impl ReplayParser {
    /// Create a parser with the given limits
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Limits in effect
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the file at `path`
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<Replay> {
        Ok(self.parse_path_detailed(path)?.replay)
    }

    /// Parse the file at `path`, keeping transport and checksum details
    pub fn parse_path_detailed(&self, path: impl AsRef<Path>) -> Result<ParsedReplay> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let logical = read_logical(file, &self.options)?;
        tracing::debug!(
            path = %path.display(),
            transport = %logical.transport,
            len = logical.bytes.len(),
            "read replay file"
        );
        self.decode_logical(logical)
    }

    /// Parse from a seekable source
    pub fn parse_reader<R: Read + Seek>(&self, source: R) -> Result<Replay> {
        let logical = read_logical(source, &self.options)?;
        Ok(self.decode_logical(logical)?.replay)
    }

    /// Parse from a buffered source that cannot seek (a pipe or stdin)
    pub fn parse_buffered<R: BufRead>(&self, source: R) -> Result<Replay> {
        let logical = read_logical_buffered(source, &self.options)?;
        Ok(self.decode_logical(logical)?.replay)
    }

    /// Parse raw file bytes already in memory
    pub fn parse_bytes(&self, raw: &[u8]) -> Result<Replay> {
        Ok(self.parse_bytes_detailed(raw)?.replay)
    }

    /// Parse raw file bytes, keeping transport and checksum details
    pub fn parse_bytes_detailed(&self, raw: &[u8]) -> Result<ParsedReplay> {
        if raw.len() as u64 > self.options.max_logical_bytes {
            return Err(ReplayError::unsupported(format!(
                "content exceeds {} bytes",
                self.options.max_logical_bytes
            )));
        }
        let logical = decode_transport(Transport::sniff(raw), raw.to_vec(), &self.options)?;
        self.decode_logical(logical)
    }

    fn decode_logical(&self, logical: LogicalBytes) -> Result<ParsedReplay> {
        let LogicalBytes { transport, bytes } = logical;
        let mut cursor = ByteCursor::new(&bytes);

        let (replay, checksums) = if is_rich_header(&bytes) {
            let header = decode_header(&mut cursor)?;
            let checksums = validate_checksums(&header.blocks)?;
            let events = decode_event_stream(&mut cursor, &self.options)?;
            let game = RecordedGame {
                header: header.metadata,
                events,
            };
            (Replay::Recorded(game), Some(checksums))
        } else {
            let events = decode_event_stream(&mut cursor, &self.options)?;
            (Replay::Events(events), None)
        };

        tracing::debug!(
            kind = %replay.kind(),
            %transport,
            events = replay.events().len(),
            "decoded replay"
        );

        Ok(ParsedReplay {
            replay,
            transport,
            logical_len: bytes.len(),
            checksums,
        })
    }
}

/// Parse the file at `path` with default limits
pub fn parse(path: impl AsRef<Path>) -> Result<Replay> {
    ReplayParser::default().parse_path(path)
}

//! Transport detection
//!
//! Replays may be gzip-wrapped regardless of their file extension, so the
//! decision is made from the leading bytes only. Seekable sources are
//! rewound after detection; buffered sources keep the magic in a prefix
//! buffer that is chained back in front of the rest.

use std::io::{BufRead, Read, Seek, SeekFrom};

use flate2::read::MultiGzDecoder;
use serde::Serialize;

use crate::error::{Field, ReplayError, Result};
use crate::options::ParseOptions;

/// gzip magic number (RFC 1952)
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Outer encoding of a replay file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Stored as-is
    Plain,
    /// gzip-compressed
    Gzip,
}

impl Transport {
    /// Classify from the first bytes of a source
    pub fn sniff(prefix: &[u8]) -> Self {
        if prefix.starts_with(&GZIP_MAGIC) {
            Transport::Gzip
        } else {
            Transport::Plain
        }
    }

    /// Peek the magic of a seekable source and rewind it to offset 0
    pub fn detect<R: Read + Seek>(source: &mut R) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 2];
        let filled = read_up_to(source, &mut magic)?;
        source.seek(SeekFrom::Start(0))?;
        Ok(Self::sniff(&magic[..filled]))
    }

    /// Peek the magic of a buffered source without consuming anything.
    ///
    /// Only the bytes the first fill returns are inspected. A source whose
    /// fill yields a single `0x1F` is ambiguous here;
    /// [`read_logical_buffered`] reads the magic itself instead.
    pub fn detect_buffered<R: BufRead>(source: &mut R) -> Result<Self> {
        let buf = source.fill_buf()?;
        Ok(Self::sniff(buf))
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Plain => f.write_str("plain"),
            Transport::Gzip => f.write_str("gzip"),
        }
    }
}

/// Uncompressed replay content
#[derive(Debug, Clone)]
pub struct LogicalBytes {
    pub transport: Transport,
    pub bytes: Vec<u8>,
}

/// Detect the transport of a seekable source and return its logical content
pub fn read_logical<R: Read + Seek>(mut source: R, options: &ParseOptions) -> Result<LogicalBytes> {
    let transport = Transport::detect(&mut source)?;
    let raw = read_capped(source, options.max_logical_bytes)?;
    decode_transport(transport, raw, options)
}

/// Detect the transport of a buffered, possibly non-seekable source
pub fn read_logical_buffered<R: BufRead>(
    mut source: R,
    options: &ParseOptions,
) -> Result<LogicalBytes> {
    let transport = match Transport::detect_buffered(&mut source)? {
        Transport::Gzip => Transport::Gzip,
        // Short fills (pipes) can hide the second magic byte
        Transport::Plain => {
            let mut magic = [0u8; 2];
            let filled = read_up_to(&mut source, &mut magic)?;
            let prefix = &magic[..filled];
            let raw = read_capped(prefix.chain(source), options.max_logical_bytes)?;
            return decode_transport(Transport::sniff(prefix), raw, options);
        }
    };
    let raw = read_capped(source, options.max_logical_bytes)?;
    decode_transport(transport, raw, options)
}

/// Unwrap raw file bytes that are already in memory
pub fn decode_transport(
    transport: Transport,
    raw: Vec<u8>,
    options: &ParseOptions,
) -> Result<LogicalBytes> {
    let bytes = match transport {
        Transport::Plain => raw,
        Transport::Gzip => {
            let limit = options.max_logical_bytes;
            let mut out = Vec::new();
            // Every member of a concatenated stream (RFC 1952 2.2)
            MultiGzDecoder::new(raw.as_slice())
                .take(limit.saturating_add(1))
                .read_to_end(&mut out)
                .map_err(gzip_error)?;
            if out.len() as u64 > limit {
                return Err(too_large(limit));
            }
            tracing::debug!(
                compressed = raw.len(),
                decompressed = out.len(),
                "decompressed gzip transport"
            );
            out
        }
    };
    Ok(LogicalBytes { transport, bytes })
}

fn read_capped<R: Read>(source: R, limit: u64) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    source.take(limit.saturating_add(1)).read_to_end(&mut raw)?;
    if raw.len() as u64 > limit {
        return Err(too_large(limit));
    }
    Ok(raw)
}

fn too_large(limit: u64) -> ReplayError {
    ReplayError::unsupported(format!("content exceeds {limit} bytes"))
}

/// The gzip decoder only ever reads from memory, so every error it raises
/// describes the stream itself.
fn gzip_error(err: std::io::Error) -> ReplayError {
    let detail = if err.kind() == std::io::ErrorKind::UnexpectedEof {
        format!("truncated gzip stream: {err}")
    } else {
        format!("invalid gzip stream: {err}")
    };
    ReplayError::CorruptInput {
        field: Field::GzipStream,
        index: None,
        detail,
    }
}

/// Fill as much of `buf` as the source allows, stopping at EOF.
fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReplayError::Io(e)),
        }
    }
    Ok(filled)
}

//! Decoder limits

use serde::{Deserialize, Serialize};

/// Default cap on decompressed (logical) bytes: 256 MiB
pub const DEFAULT_MAX_LOGICAL_BYTES: u64 = 256 * 1024 * 1024;

/// Default cap on the declared event count
pub const DEFAULT_MAX_EVENTS: u32 = 10_000_000;

/// Limits applied while decoding untrusted input.
///
/// Loaded from the `[parse]` table of `aoe2rec.toml` by the CLI; every
/// field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum number of bytes the transport layer may produce.
    /// Larger inputs (after decompression) are rejected as unsupported.
    pub max_logical_bytes: u64,

    /// Maximum declared event count accepted before the plausibility check.
    pub max_events: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_logical_bytes: DEFAULT_MAX_LOGICAL_BYTES,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

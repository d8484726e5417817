//! String block integrity checks

use serde::Serialize;

use crate::error::{ReplayError, Result};
use crate::types::{BlockEntry, BlockKind, ChecksumEntry, StringBlock};

/// Counts from a successful validation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChecksumSummary {
    /// Entries whose CRC-32 matched
    pub verified: usize,
    /// Entries declaring a checksum of zero
    pub unchecked: usize,
    /// Opaque entries carried without validation
    pub skipped: usize,
}

impl ChecksumEntry {
    /// CRC-32 of the payload
    pub fn actual_crc(&self) -> u32 {
        crc32fast::hash(&self.payload)
    }

    /// Whether the payload matches; a declared checksum of zero always does
    pub fn is_valid(&self) -> bool {
        self.expected_crc == 0 || self.expected_crc == self.actual_crc()
    }
}

/// Verify every checksum entry of every block.
///
/// The first mismatch fails the whole file.
pub fn validate_checksums(blocks: &[StringBlock]) -> Result<ChecksumSummary> {
    let mut summary = ChecksumSummary::default();

    // RMS blocks first, then the rest in file order; indices stay file indices
    let rms = blocks.iter().enumerate().filter(|(_, b)| b.kind == BlockKind::Rms);
    let other = blocks.iter().enumerate().filter(|(_, b)| b.kind != BlockKind::Rms);

    for (block_index, block) in rms.chain(other) {
        for (entry_index, entry) in block.entries.iter().enumerate() {
            let entry = match entry {
                BlockEntry::Checksum(entry) => entry,
                BlockEntry::Opaque { .. } => {
                    summary.skipped += 1;
                    continue;
                }
            };

            if entry.expected_crc == 0 {
                summary.unchecked += 1;
                continue;
            }

            let actual = entry.actual_crc();
            if actual != entry.expected_crc {
                tracing::debug!(
                    block = block_index,
                    entry = entry_index,
                    kind = ?block.kind,
                    "string block checksum mismatch"
                );
                return Err(ReplayError::ChecksumMismatch {
                    block: block_index,
                    entry: entry_index,
                    expected: entry.expected_crc,
                    actual,
                });
            }
            summary.verified += 1;
        }
    }

    tracing::debug!(
        verified = summary.verified,
        unchecked = summary.unchecked,
        skipped = summary.skipped,
        "string block checksums validated"
    );
    Ok(summary)
}

//! Total text decoding for replay string fields
//!
//! Player names in recorded games come from clients with mixed encodings, so
//! decoding never fails. Three tiers are tried in order:
//!
//! 1. Strict UTF-8
//! 2. Legacy single-byte (ISO-8859-1), when the payload shows no sign of UTF-8
//! 3. Lossy UTF-8, with U+FFFD in place of invalid sequences
//!
//! A payload "shows a sign of UTF-8" when its valid prefix already contains a
//! multi-byte sequence, or when its only defect is a final byte that cannot
//! begin any UTF-8 sequence (`0xFF`, `0xFE`, a stray continuation byte). An
//! unfinished lead byte at the end of plain ASCII text is a Latin-1 letter:
//! `Ren\xE9` is "René".

use std::str::Utf8Error;

use serde::Serialize;

/// Which tier produced a decoded string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Valid UTF-8
    Utf8,
    /// Legacy single-byte decoding
    Legacy,
    /// UTF-8 with replacement characters
    Lossy,
}

/// A decoded string and the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl DecodedText {
    /// Whether any tier other than strict UTF-8 was needed
    pub fn is_fallback(&self) -> bool {
        self.encoding != TextEncoding::Utf8
    }
}

/// Decode `bytes` into text. Never fails.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText {
            text: text.to_owned(),
            encoding: TextEncoding::Utf8,
        },
        Err(err) if is_legacy_candidate(bytes, &err) => {
            tracing::trace!(len = bytes.len(), "decoding text as legacy single-byte");
            DecodedText {
                text: decode_legacy(bytes),
                encoding: TextEncoding::Legacy,
            }
        }
        Err(_) => {
            tracing::trace!(len = bytes.len(), "decoding text lossily");
            DecodedText {
                text: String::from_utf8_lossy(bytes).into_owned(),
                encoding: TextEncoding::Lossy,
            }
        }
    }
}

/// Decode `bytes` and keep only the text
pub fn decode_string(bytes: &[u8]) -> String {
    decode_text(bytes).text
}

/// ISO-8859-1: each byte is the code point of the same value
fn decode_legacy(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn is_legacy_candidate(bytes: &[u8], err: &Utf8Error) -> bool {
    let valid = &bytes[..err.valid_up_to()];
    if !valid.is_ascii() {
        return false;
    }
    match err.error_len() {
        // Unfinished sequence at the end of input
        None => true,
        Some(len) => err.valid_up_to() + len < bytes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8() {
        let decoded = decode_text("Zoë 🏰".as_bytes());
        assert_eq!(decoded.text, "Zoë 🏰");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert!(!decoded.is_fallback());
    }

    #[test]
    fn test_empty_payload() {
        let decoded = decode_text(b"");
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_legacy_latin1_name() {
        let decoded = decode_text(b"Jos\xE9 M\xE1rquez");
        assert_eq!(decoded.text, "José Márquez");
        assert_eq!(decoded.encoding, TextEncoding::Legacy);
    }

    #[test]
    fn test_trailing_invalid_byte_is_replaced() {
        let decoded = decode_text(b"Alice\xFF");
        assert_eq!(decoded.text, "Alice\u{FFFD}");
        assert_eq!(decoded.encoding, TextEncoding::Lossy);
    }

    #[test]
    fn test_trailing_latin1_letter_is_legacy() {
        let decoded = decode_text(b"Ren\xE9");
        assert_eq!(decoded.text, "René");
        assert_eq!(decoded.encoding, TextEncoding::Legacy);

        let decoded = decode_text(b"Fran\xE7ois Cr\xE9");
        assert_eq!(decoded.text, "François Cré");
        assert_eq!(decoded.encoding, TextEncoding::Legacy);
    }

    #[test]
    fn test_trailing_byte_order_mark_halves_are_replaced() {
        for bytes in [b"Bob\xFE", b"Bob\xFF"] {
            let decoded = decode_text(bytes);
            assert_eq!(decoded.text, "Bob\u{FFFD}");
            assert_eq!(decoded.encoding, TextEncoding::Lossy);
        }
    }

    #[test]
    fn test_clipped_multibyte_tail_is_replaced() {
        // "é" is C3 A9; the payload lost its final byte after real UTF-8
        let decoded = decode_text(b"\xC3\xA9t\xC3");
        assert_eq!(decoded.text, "\u{E9}t\u{FFFD}");
        assert_eq!(decoded.encoding, TextEncoding::Lossy);
    }

    #[test]
    fn test_mixed_utf8_and_garbage_is_lossy() {
        // Valid multi-byte prefix means this is UTF-8 with a bad byte in the middle
        let decoded = decode_text(b"\xC3\xA9t\xFFe");
        assert_eq!(decoded.text, "ét\u{FFFD}e");
        assert_eq!(decoded.encoding, TextEncoding::Lossy);
    }

    #[test]
    fn test_every_byte_sequence_decodes() {
        let all: Vec<u8> = (0..=255u8).collect();
        let decoded = decode_text(&all);
        assert!(!decoded.text.is_empty());
    }
}

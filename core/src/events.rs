//! Event stream decoding
//!
//! ```text
//! [4]  event_count: u32
//! repeat event_count times:
//!   [4]  timestamp: u32
//!   [1]  player_name_len: u8
//!   [n]  player_name
//!   [1]  event_name_len: u8
//!   [n]  event_name
//! ```
//!
//! The declared count is checked against the remaining bytes before the
//! output vector is allocated, so a foreign file with a huge "count" is
//! rejected as unsupported instead of being decoded until it runs dry.

use crate::cursor::ByteCursor;
use crate::error::{Field, ReplayError, Result};
use crate::options::ParseOptions;
use crate::text::decode_text;
use crate::types::Event;

/// Smallest possible encoded event: timestamp plus two empty names
pub const MIN_EVENT_SIZE: u64 = 4 + 1 + 1;

/// Decode a complete event stream from logical bytes.
///
/// Bytes after the last declared event are ignored.
pub fn decode_events(data: &[u8], options: &ParseOptions) -> Result<Vec<Event>> {
    let mut cursor = ByteCursor::new(data);
    decode_event_stream(&mut cursor, options)
}

/// Decode an event stream starting at the cursor position
pub(crate) fn decode_event_stream(
    cursor: &mut ByteCursor<'_>,
    options: &ParseOptions,
) -> Result<Vec<Event>> {
    let declared = cursor.read_u32(Field::EventCount)?;
    check_plausible(declared, cursor.remaining() as u64, options)?;

    let mut events = Vec::with_capacity(declared as usize);
    for index in 0..declared {
        // Running dry exactly on a record boundary means the count does not
        // describe this data; running dry inside a record is truncation.
        if cursor.remaining() == 0 {
            return Err(ReplayError::unsupported(format!(
                "declared {declared} events but the stream ends after {index}"
            )));
        }
        cursor.set_record(Some(u64::from(index)));
        events.push(decode_event(cursor, index)?);
    }
    cursor.set_record(None);

    let trailing = cursor.remaining();
    if trailing > 0 {
        tracing::debug!(trailing, "ignoring bytes after the last declared event");
    }
    Ok(events)
}

/// Reject counts that cannot fit in the remaining bytes
fn check_plausible(declared: u32, remaining: u64, options: &ParseOptions) -> Result<()> {
    if declared > options.max_events {
        return Err(ReplayError::unsupported(format!(
            "declared event count {declared} exceeds limit {}",
            options.max_events
        )));
    }
    let minimum = u64::from(declared) * MIN_EVENT_SIZE;
    if minimum > remaining {
        return Err(ReplayError::unsupported(format!(
            "declared {declared} events need at least {minimum} bytes, {remaining} remain"
        )));
    }
    Ok(())
}

fn decode_event(cursor: &mut ByteCursor<'_>, index: u32) -> Result<Event> {
    let timestamp = cursor.read_u32(Field::Timestamp)?;
    let player = cursor.read_prefixed(Field::PlayerLength, Field::PlayerName)?;
    let event = cursor.read_prefixed(Field::EventLength, Field::EventName)?;

    let player = decode_text(player);
    let event = decode_text(event);
    if player.is_fallback() || event.is_fallback() {
        tracing::debug!(
            index,
            player = ?player.encoding,
            event = ?event.encoding,
            "event text needed a decoding fallback"
        );
    }

    Ok(Event {
        timestamp,
        player: player.text,
        event: event.text,
    })
}

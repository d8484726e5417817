//! Bounds-checked reader over logical replay bytes
//!
//! Every read names the [`Field`] it is decoding so a short read turns into
//! a [`ReplayError::TruncatedInput`] that says exactly what was cut off.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Field, ReplayError, Result};

/// Cursor over an in-memory byte slice
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Record index attached to truncation errors
    record: Option<u64>,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            record: None,
        }
    }

    /// Current offset from the start of the data
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current position
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Attach a record index to subsequent truncation errors
    pub fn set_record(&mut self, record: Option<u64>) {
        self.record = record;
    }

    /// Take exactly `len` bytes
    pub fn take(&mut self, len: usize, field: Field) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(ReplayError::TruncatedInput {
                field,
                index: self.record,
                needed: len as u64,
                available: available as u64,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a single byte
    pub fn read_u8(&mut self, field: Field) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self, field: Field) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2, field)?))
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self, field: Field) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4, field)?))
    }

    /// Read a `u8` length prefix followed by that many bytes
    pub fn read_prefixed(&mut self, len_field: Field, payload_field: Field) -> Result<&'a [u8]> {
        let len = self.read_u8(len_field)? as usize;
        self.take(len, payload_field)
    }
}

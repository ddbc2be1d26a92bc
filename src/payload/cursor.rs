//! # Byte Cursor
//!
//! Sequential, bounds-checked reader over one uplink payload. Every read either
//! advances the position by exactly the bytes it consumed or fails with
//! [`DecodeError::TruncatedPayload`] and leaves the position untouched, so
//! `0 <= position <= len` holds at all times.

use crate::constants::ROM_ID_LEN;
use crate::error::DecodeError;
use crate::util::hex::encode_hex_upper;

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Forward reader over an immutable payload.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total payload length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    fn ensure(&self, count: usize) -> Result<(), DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::TruncatedPayload {
                offset: self.pos,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow the next `count` bytes and advance past them.
    pub fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(count)?;
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Advance without interpreting the bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.take(count).map(|_| ())
    }

    /// Read the next byte without advancing.
    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_uint(2, Endian::Big)? as u16)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_uint(2, Endian::Little)? as u16)
    }

    pub fn read_u24(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint(3, Endian::Big)? as u32)
    }

    pub fn read_u24_le(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint(3, Endian::Little)? as u32)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint(4, Endian::Big)? as u32)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint(4, Endian::Little)? as u32)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_uint(8, Endian::Big)
    }

    /// Read an unsigned integer of 1 to 8 bytes.
    pub fn read_uint(&mut self, count: usize, endian: Endian) -> Result<u64, DecodeError> {
        debug_assert!((1..=8).contains(&count));
        let bytes = self.take(count)?;
        let value = match endian {
            Endian::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
            Endian::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64),
        };
        Ok(value)
    }

    /// Read a byte-reversed 1-Wire ROM identifier as 16 uppercase hex digits.
    ///
    /// Firmware emits the ROM least significant byte first; the rendered string
    /// is most significant byte first. The cursor moves forward by 8 bytes.
    pub fn read_rom_reversed(&mut self) -> Result<String, DecodeError> {
        let bytes = self.take(ROM_ID_LEN)?;
        let mut rom = [0u8; ROM_ID_LEN];
        rom.copy_from_slice(bytes);
        rom.reverse();
        Ok(encode_hex_upper(&rom))
    }
}

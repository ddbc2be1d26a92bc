//! # Mask Reader
//!
//! Presence masks announce which optional fields follow in the stream, one
//! bit per field, least significant bit first. `MaskReader` keeps the bit
//! index that the fields consume so a schema can be a flat ordered list.

use crate::error::DecodeError;
use crate::payload::cursor::{ByteCursor, Endian};

/// Width of a mask as transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskWidth {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl MaskWidth {
    pub fn bytes(self) -> usize {
        match self {
            MaskWidth::Bits8 => 1,
            MaskWidth::Bits16 => 2,
            MaskWidth::Bits24 => 3,
            MaskWidth::Bits32 => 4,
        }
    }

    pub fn bits(self) -> u8 {
        (self.bytes() * 8) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskReader {
    value: u32,
    width: MaskWidth,
    index: u8,
}

impl MaskReader {
    pub fn new(value: u32, width: MaskWidth) -> Self {
        let value = match width {
            MaskWidth::Bits32 => value,
            _ => value & ((1u32 << width.bits()) - 1),
        };
        Self {
            value,
            width,
            index: 0,
        }
    }

    /// A mask with no bits set; every field it gates is absent.
    pub fn empty(width: MaskWidth) -> Self {
        Self::new(0, width)
    }

    /// Read a big-endian mask from the stream.
    pub fn read(cursor: &mut ByteCursor<'_>, width: MaskWidth) -> Result<Self, DecodeError> {
        let raw = cursor.read_uint(width.bytes(), Endian::Big)? as u32;
        Ok(Self::new(raw, width))
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn width(&self) -> MaskWidth {
        self.width
    }

    /// Index of the bit the next `next_bit` call returns.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Test bit `k` without consuming it. Bits past the width read as clear.
    pub fn bit(&self, k: u8) -> bool {
        k < self.width.bits() && (self.value >> k) & 0x01 != 0
    }

    /// Return the bit at the running index and advance it.
    pub fn next_bit(&mut self) -> bool {
        let set = self.bit(self.index);
        self.index = self.index.saturating_add(1);
        set
    }

    /// Advance the running index without testing.
    pub fn skip(&mut self, count: u8) {
        self.index = self.index.saturating_add(count);
    }

    /// Extract `len` bits starting at `shift` as an integer.
    pub fn field(&self, shift: u8, len: u8) -> u32 {
        if shift >= self.width.bits() || len == 0 {
            return 0;
        }
        let mask = if len >= 32 { u32::MAX } else { (1u32 << len) - 1 };
        (self.value >> shift) & mask
    }

    /// Whether any bit under `bits` is set.
    pub fn any(&self, bits: u32) -> bool {
        self.value & bits != 0
    }
}

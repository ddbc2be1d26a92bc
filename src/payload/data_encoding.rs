//! # Numeric Codecs
//!
//! Pure conversions from raw payload integers to physical values: fixed-point
//! scale and offset, two's complement, Kelvin offsets, firmware version
//! layouts, sign-magnitude coordinates and enumerated labels.

use crate::constants::KELVIN_OFFSET;
use crate::error::DecodeError;

/// Round half away from zero at `decimals` places.
pub fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `raw / scale + offset`, rounded at `decimals` places.
pub fn linear(raw: f64, scale: f64, offset: f64, decimals: u8) -> f64 {
    round_to(raw / scale + offset, decimals)
}

/// Centi-Kelvin style temperature to degrees Celsius.
pub fn kelvin_to_celsius(raw: f64, scale: f64, decimals: u8) -> f64 {
    linear(raw, scale, KELVIN_OFFSET, decimals)
}

/// Reinterpret the low `width` bits of `raw` as a two's complement integer.
pub fn twos_complement(raw: u64, width: u8) -> i64 {
    debug_assert!((1..=64).contains(&width));
    if width >= 64 {
        return raw as i64;
    }
    let raw = raw & ((1u64 << width) - 1);
    if raw >> (width - 1) & 0x01 != 0 {
        raw as i64 - (1i64 << width)
    } else {
        raw as i64
    }
}

/// Four-part version from two bytes of packed nibbles: `0x12 0x34` is `1.2.3.4`.
pub fn bcd_firmware(hi: u8, lo: u8) -> String {
    format!("{}.{}.{}.{}", hi >> 4, hi & 0x0F, lo >> 4, lo & 0x0F)
}

/// Nibble-swapped variant used by ITP 1xx reports: the second byte carries
/// the major parts, low nibble first.
pub fn bcd_firmware_swapped(first: u8, second: u8) -> String {
    format!(
        "{}.{}.{}.{}",
        second & 0x0F,
        second >> 4,
        first & 0x0F,
        first >> 4
    )
}

/// Decimal-packed version `HHCCFFBB`: hardware, compatibility, feature and
/// bug-fix numbers by successive integer division.
pub fn packed_firmware(raw: u32) -> String {
    let hardware = raw / 1_000_000;
    let compatibility = (raw / 10_000) % 100;
    let feature = (raw / 100) % 100;
    let bug = raw % 100;
    format!("{hardware}.{compatibility}.{feature}.{bug}")
}

/// Four decimal digits of a 16-bit value as a dotted version: `1234` is `1.2.3.4`.
pub fn decimal_firmware(raw: u16) -> String {
    format!(
        "{}.{}.{}.{}",
        raw / 1000,
        (raw % 1000) / 100,
        (raw % 100) / 10,
        raw % 10
    )
}

/// Sign-magnitude coordinate in micro-degrees: bit 31 is the sign flag.
pub fn signed_lat_lon(raw: u32) -> f64 {
    let magnitude = (raw & 0x7FFF_FFFF) as f64 / 1_000_000.0;
    let value = if raw >> 31 & 0x01 != 0 {
        -magnitude
    } else {
        magnitude
    };
    round_to(value, 6)
}

/// A closed set of labels indexed by a raw value starting at `first`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumTable {
    pub name: &'static str,
    pub first: u32,
    pub labels: &'static [&'static str],
}

impl EnumTable {
    pub const fn new(name: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            first: 0,
            labels,
        }
    }

    pub const fn starting_at(
        name: &'static str,
        first: u32,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            first,
            labels,
        }
    }

    pub fn lookup(&self, raw: u32) -> Result<&'static str, DecodeError> {
        raw.checked_sub(self.first)
            .and_then(|i| self.labels.get(i as usize))
            .copied()
            .ok_or(DecodeError::UnknownEnumValue {
                table: self.name,
                value: raw,
            })
    }
}

/// Label for `raw` in `table`, or `UnknownEnumValue`.
pub fn enum_lookup(raw: u32, table: &EnumTable) -> Result<&'static str, DecodeError> {
    table.lookup(raw)
}

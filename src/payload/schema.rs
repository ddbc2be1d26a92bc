//! # Field Schemas
//!
//! Device layouts are written as static tables of [`Step`]s and run against a
//! [`ByteCursor`] and a [`MaskReader`]. Each step names its presence rule,
//! output group, field name, unit and decode primitive; the interpreter keeps
//! the mask bit index and the cursor in lock step, so a schema reads as the
//! payload layout in transmission order.

use crate::error::DecodeError;
use crate::payload::cursor::{ByteCursor, Endian};
use crate::payload::data_encoding::{
    bcd_firmware, kelvin_to_celsius, linear, packed_firmware, signed_lat_lon, twos_complement,
    EnumTable,
};
use crate::payload::mask::MaskReader;
use crate::payload::record::{Document, Group, Record, Value};

/// When a field appears in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    /// Consume the mask's running bit.
    NextBit,
    /// Test a fixed bit without consuming.
    Bit(u8),
}

impl Presence {
    pub fn eval(self, mask: &mut MaskReader) -> bool {
        match self {
            Presence::Always => true,
            Presence::NextBit => mask.next_bit(),
            Presence::Bit(k) => mask.bit(k),
        }
    }
}

/// Decode primitive for one field. Widths are in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Codec {
    /// Raw unsigned integer.
    Unsigned { width: u8, endian: Endian },
    /// `raw / scale + offset`, rounded.
    Linear {
        width: u8,
        endian: Endian,
        scale: f64,
        offset: f64,
        decimals: u8,
    },
    /// Two's complement integer divided by `scale`.
    Signed {
        width: u8,
        endian: Endian,
        scale: f64,
        decimals: u8,
    },
    /// Scaled Kelvin reading reported in degrees Celsius.
    Kelvin {
        width: u8,
        endian: Endian,
        scale: f64,
        decimals: u8,
    },
    /// One byte looked up in a label table.
    Enum(&'static EnumTable),
    /// One byte, non-zero selects `on`.
    Boolean {
        on: &'static str,
        off: &'static str,
    },
    /// Two bytes of nibble-packed version digits.
    FirmwareBcd,
    /// Three bytes of decimal-packed version number.
    FirmwarePacked(Endian),
    /// One byte exponent, value `10^exp`.
    PowerOfTen,
    /// Four byte sign-magnitude micro-degrees.
    LatLon,
    /// Eight byte reversed 1-Wire ROM identifier.
    Rom,
    /// Fixed label, consumes nothing.
    Constant(&'static str),
}

impl Codec {
    pub const fn unsigned(width: u8) -> Self {
        Codec::Unsigned {
            width,
            endian: Endian::Big,
        }
    }

    pub const fn scaled(width: u8, scale: f64, decimals: u8) -> Self {
        Codec::Linear {
            width,
            endian: Endian::Big,
            scale,
            offset: 0.0,
            decimals,
        }
    }

    pub const fn offset(width: u8, scale: f64, offset: f64, decimals: u8) -> Self {
        Codec::Linear {
            width,
            endian: Endian::Big,
            scale,
            offset,
            decimals,
        }
    }

    pub const fn kelvin(width: u8, scale: f64, decimals: u8) -> Self {
        Codec::Kelvin {
            width,
            endian: Endian::Big,
            scale,
            decimals,
        }
    }

    /// Same primitive read little-endian.
    pub const fn le(self) -> Self {
        match self {
            Codec::Unsigned { width, .. } => Codec::Unsigned {
                width,
                endian: Endian::Little,
            },
            Codec::Linear {
                width,
                scale,
                offset,
                decimals,
                ..
            } => Codec::Linear {
                width,
                endian: Endian::Little,
                scale,
                offset,
                decimals,
            },
            Codec::Signed {
                width,
                scale,
                decimals,
                ..
            } => Codec::Signed {
                width,
                endian: Endian::Little,
                scale,
                decimals,
            },
            Codec::Kelvin {
                width,
                scale,
                decimals,
                ..
            } => Codec::Kelvin {
                width,
                endian: Endian::Little,
                scale,
                decimals,
            },
            Codec::FirmwarePacked(_) => Codec::FirmwarePacked(Endian::Little),
            other => other,
        }
    }

    /// Decode one value, advancing the cursor by the codec's width.
    pub fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Value, DecodeError> {
        let value = match *self {
            Codec::Unsigned { width, endian } => {
                Value::Number(cursor.read_uint(width as usize, endian)? as f64)
            }
            Codec::Linear {
                width,
                endian,
                scale,
                offset,
                decimals,
            } => {
                let raw = cursor.read_uint(width as usize, endian)?;
                Value::Number(linear(raw as f64, scale, offset, decimals))
            }
            Codec::Signed {
                width,
                endian,
                scale,
                decimals,
            } => {
                let raw = cursor.read_uint(width as usize, endian)?;
                let signed = twos_complement(raw, width * 8);
                Value::Number(linear(signed as f64, scale, 0.0, decimals))
            }
            Codec::Kelvin {
                width,
                endian,
                scale,
                decimals,
            } => {
                let raw = cursor.read_uint(width as usize, endian)?;
                Value::Number(kelvin_to_celsius(raw as f64, scale, decimals))
            }
            Codec::Enum(table) => Value::Label(table.lookup(cursor.read_u8()? as u32)?),
            Codec::Boolean { on, off } => {
                Value::Label(if cursor.read_u8()? != 0 { on } else { off })
            }
            Codec::FirmwareBcd => {
                let bytes = cursor.take(2)?;
                Value::Text(bcd_firmware(bytes[0], bytes[1]))
            }
            Codec::FirmwarePacked(endian) => {
                Value::Text(packed_firmware(cursor.read_uint(3, endian)? as u32))
            }
            Codec::PowerOfTen => Value::Number(10f64.powi(cursor.read_u8()? as i32)),
            Codec::LatLon => Value::Number(signed_lat_lon(cursor.read_u32()?)),
            Codec::Rom => Value::Text(cursor.read_rom_reversed()?),
            Codec::Constant(label) => Value::Label(label),
        };
        Ok(value)
    }
}

/// Declarative description of one output field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub group: Group,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub codec: Codec,
}

impl Field {
    pub const fn new(group: Group, name: &'static str, codec: Codec) -> Self {
        Self {
            group,
            name,
            unit: None,
            codec,
        }
    }

    pub const fn unit(self, unit: &'static str) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// Decode this field and append it under `name`.
    pub fn apply(
        &self,
        name: String,
        cursor: &mut ByteCursor<'_>,
        doc: &mut Document,
    ) -> Result<(), DecodeError> {
        let value = self.codec.decode(cursor)?;
        doc.push(
            self.group,
            Record {
                name,
                value,
                unit: self.unit,
                time: None,
            },
        );
        Ok(())
    }
}

/// How a repeated block's label joins a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    /// `phase_a_voltage`
    Prefix,
    /// `rms_x`
    Suffix,
}

impl Affix {
    pub fn join(self, name: &str, label: &str) -> String {
        match self {
            Affix::Prefix => format!("{label}_{name}"),
            Affix::Suffix => format!("{name}_{label}"),
        }
    }
}

/// One field list evaluated once per label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repeat {
    /// Whole block present.
    pub gate: Presence,
    /// Each iteration present.
    pub each: Presence,
    pub labels: &'static [&'static str],
    pub affix: Affix,
    pub fields: &'static [(Presence, Field)],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A single optional field.
    Field(Presence, Field),
    /// A field that reports `default` when absent.
    FieldOr(Presence, Field, f64),
    /// Several fields behind one presence test.
    Fields(Presence, &'static [Field]),
    /// A mask bit reported as one of two labels; consumes no payload bytes.
    Flag {
        bit: Presence,
        group: Group,
        name: &'static str,
        on: &'static str,
        off: &'static str,
    },
    /// Consume mask bits that carry nothing for this layout.
    Skip(u8),
    Repeat(Repeat),
    /// One record per set bit: `names[k]` with `value` when bit `k` is set.
    BitLabels {
        group: Group,
        names: &'static [&'static str],
        value: &'static str,
    },
}

/// Run a schema to completion.
pub fn run(
    steps: &[Step],
    cursor: &mut ByteCursor<'_>,
    mask: &mut MaskReader,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    for step in steps {
        match step {
            Step::Field(presence, field) => {
                if presence.eval(mask) {
                    field.apply(field.name.to_string(), cursor, doc)?;
                }
            }
            Step::FieldOr(presence, field, default) => {
                if presence.eval(mask) {
                    field.apply(field.name.to_string(), cursor, doc)?;
                } else {
                    let mut record = Record::new(field.name, *default);
                    record.unit = field.unit;
                    doc.push(field.group, record);
                }
            }
            Step::Fields(presence, fields) => {
                if presence.eval(mask) {
                    for field in fields.iter() {
                        field.apply(field.name.to_string(), cursor, doc)?;
                    }
                }
            }
            Step::Flag {
                bit,
                group,
                name,
                on,
                off,
            } => {
                let label = if bit.eval(mask) { *on } else { *off };
                doc.push(*group, Record::new(*name, label));
            }
            Step::Skip(count) => mask.skip(*count),
            Step::Repeat(repeat) => run_repeat(repeat, cursor, mask, doc)?,
            Step::BitLabels {
                group,
                names,
                value,
            } => {
                for (k, name) in names.iter().enumerate() {
                    if mask.bit(k as u8) {
                        doc.push(*group, Record::new(*name, *value));
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_repeat(
    repeat: &Repeat,
    cursor: &mut ByteCursor<'_>,
    mask: &mut MaskReader,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    if !repeat.gate.eval(mask) {
        return Ok(());
    }
    for label in repeat.labels {
        if repeat.each.eval(mask) {
            run_block(repeat.fields, label, repeat.affix, cursor, mask, doc)?;
        }
    }
    Ok(())
}

/// Run one iteration of a repeated block with `label` joined into each name.
pub fn run_block(
    fields: &[(Presence, Field)],
    label: &str,
    affix: Affix,
    cursor: &mut ByteCursor<'_>,
    mask: &mut MaskReader,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    for (presence, field) in fields {
        if presence.eval(mask) {
            field.apply(affix.join(field.name, label), cursor, doc)?;
        }
    }
    Ok(())
}

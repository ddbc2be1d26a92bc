//! NIT 2xLI extension module chain
//!
//! After its own fields a NIT 2xLI appends zero or more extension module
//! blocks, each introduced by a one-byte type:
//!
//! | type | module        | body |
//! |------|---------------|------|
//! | 0x01 | EM S104       | mask, temperature, up to three pressure channels |
//! | 0x02 | EM C104       | mask, four current-loop channels, plain or min/max/avg |
//! | 0x04 | EM W104       | mask, weather station, pyranometer, barometer |
//! | 0x05 | EM R102       | mask, state byte, two dry contacts, two relays |
//! | 0x06 | EM ACW/THW    | mask, 1-Wire ROM, up to five readings |
//!
//! The block length is implied by the type and its mask. An unknown type
//! ends the chain; whatever was decoded up to that point is kept.

use crate::error::DecodeError;
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::linear;
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record, Stats};
use crate::payload::schema::{self, Affix, Codec, Field, Presence, Repeat, Step};
use log::{debug, warn};

/// Extension module type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    S104,
    C104,
    W104,
    R102,
    OneWire,
}

impl ModuleKind {
    pub fn from_type(kind: u8) -> Option<Self> {
        match kind {
            0x01 => Some(ModuleKind::S104),
            0x02 => Some(ModuleKind::C104),
            0x04 => Some(ModuleKind::W104),
            0x05 => Some(ModuleKind::R102),
            0x06 => Some(ModuleKind::OneWire),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::S104 => "EM S104",
            ModuleKind::C104 => "EM C104",
            ModuleKind::W104 => "EM W104",
            ModuleKind::R102 => "EM R102",
            ModuleKind::OneWire => "EM ACW/THW",
        }
    }
}

const S104: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Modules, "ems_e1_temp", Codec::kelvin(2, 100.0, 2).le()).unit("C"),
    ),
    Step::Repeat(Repeat {
        gate: Presence::Always,
        each: Presence::NextBit,
        labels: &["ems_e2", "ems_e3", "ems_e4"],
        affix: Affix::Prefix,
        fields: &[(
            Presence::Always,
            Field::new(Group::Modules, "kpa", Codec::scaled(2, 100.0, 2).le()).unit("kPa"),
        )],
    }),
];

const W104_WEATHER: &[Step] = &[Step::Fields(
    Presence::Bit(0),
    &[
        Field::new(Group::Modules, "emw_rain_lvl", Codec::scaled(2, 10.0, 1)).unit("mm"),
        Field::new(Group::Modules, "emw_avg_wind_speed", Codec::unsigned(1)).unit("km/h"),
        Field::new(Group::Modules, "emw_gust_wind_speed", Codec::unsigned(1)).unit("km/h"),
        Field::new(Group::Modules, "emw_wind_direction", Codec::unsigned(2)).unit("graus"),
        Field::new(Group::Modules, "emw_temperature", Codec::kelvin(2, 10.0, 2)).unit("C"),
        Field::new(Group::Modules, "emw_humidity", Codec::unsigned(1)).unit("%"),
    ],
)];

/// Only sent by stations that report the weather block.
const W104_LIGHT: &[Step] = &[Step::Fields(
    Presence::Bit(1),
    &[
        Field::new(Group::Modules, "emw_luminosity", Codec::unsigned(3)).unit("lx"),
        Field::new(Group::Modules, "emw_uv", Codec::scaled(1, 10.0, 1)).unit("/"),
    ],
)];

const W104_TAIL: &[Step] = &[
    Step::Field(
        Presence::Bit(2),
        Field::new(Group::Modules, "emw_solar_radiation", Codec::scaled(2, 10.0, 1)).unit("W/m²"),
    ),
    Step::Field(
        Presence::Bit(3),
        Field::new(Group::Modules, "emw_atm_pres", Codec::scaled(3, 100.0, 2)).unit("hPa"),
    ),
];

const ONE_WIRE: &[(Presence, Field)] = &[
    (
        Presence::Bit(0),
        Field::new(Group::Modules, "temperature", Codec::kelvin(2, 100.0, 2).le()).unit("C"),
    ),
    (
        Presence::Bit(1),
        Field::new(Group::Modules, "humidity", Codec::scaled(2, 100.0, 2).le()).unit("%"),
    ),
    (
        Presence::Bit(2),
        Field::new(Group::Modules, "luminosity", Codec::unsigned(2).le()).unit("lux"),
    ),
    (
        Presence::Bit(3),
        Field::new(Group::Modules, "noise", Codec::scaled(2, 100.0, 2).le()).unit("dB"),
    ),
    (
        Presence::Bit(4),
        Field::new(Group::Modules, "temperature_rtdt", Codec::kelvin(4, 100.0, 2).le()).unit("C"),
    ),
];

const C104_CHANNELS: u8 = 4;
const C104_STATS: u8 = 4;

/// Decode extension modules until the payload ends or an unknown type byte
/// is found.
pub fn decode_chain(cursor: &mut ByteCursor<'_>, doc: &mut Document) -> Result<(), DecodeError> {
    while cursor.has_remaining() {
        let kind = cursor.peek_u8()?;
        let Some(module) = ModuleKind::from_type(kind) else {
            warn!(
                "{}; keeping {} decoded record(s)",
                DecodeError::UnrecognizedExtensionModule(kind),
                doc.len()
            );
            return Ok(());
        };
        cursor.skip(1)?;
        debug!("extension module {} at offset {}", module.name(), cursor.position());
        decode_module(module, cursor, doc)?;
    }
    Ok(())
}

fn decode_module(
    module: ModuleKind,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    let mut mask = MaskReader::read(cursor, MaskWidth::Bits8)?;
    match module {
        ModuleKind::S104 => schema::run(S104, cursor, &mut mask, doc),
        ModuleKind::C104 => decode_c104(&mask, cursor, doc),
        ModuleKind::W104 => {
            schema::run(W104_WEATHER, cursor, &mut mask, doc)?;
            if mask.bit(0) {
                schema::run(W104_LIGHT, cursor, &mut mask, doc)?;
            }
            schema::run(W104_TAIL, cursor, &mut mask, doc)
        }
        ModuleKind::R102 => decode_r102(&mask, cursor, doc),
        ModuleKind::OneWire => decode_one_wire(&mut mask, cursor, doc),
    }
}

/// Channels 1..4 on mask bits 0..3. Bit 4 switches to min/max/avg reports,
/// whose parts are announced by bits 5..7 and sent as one byte each.
fn decode_c104(
    mask: &MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    let aggregated = mask.bit(C104_STATS);
    for channel in 0..C104_CHANNELS {
        if !mask.bit(channel) {
            continue;
        }
        let name = format!("emc_e{}_curr", channel + 1);
        let record = if aggregated {
            let mut part = |bit: u8| -> Result<Option<f64>, DecodeError> {
                if mask.bit(bit) {
                    Ok(Some(linear(cursor.read_u8()? as f64, 12.0, 0.0, 2)))
                } else {
                    Ok(None)
                }
            };
            let stats = Stats {
                min: part(5)?,
                max: part(6)?,
                avg: part(7)?,
            };
            Record::new(name, stats)
        } else {
            Record::new(name, linear(cursor.read_u16_le()? as f64, 1000.0, 0.0, 2))
        };
        doc.push(Group::Modules, record.with_unit("mA"));
    }
    Ok(())
}

/// Dry contacts C3/C4 and relays B3/B4. Their states live in one byte after
/// the mask; only the contacts carry a counter.
fn decode_r102(
    mask: &MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    let state = MaskReader::read(cursor, MaskWidth::Bits8)?;
    for (bit, contact) in [(0u8, "c3"), (1, "c4")] {
        if mask.bit(bit) {
            doc.push(
                Group::Modules,
                Record::new(
                    format!("emr_{contact}_status"),
                    if state.bit(bit) { "closed" } else { "open" },
                )
                .with_unit("bool"),
            );
            doc.push(
                Group::Modules,
                Record::new(format!("emr_{contact}_count"), cursor.read_u16_le()? as u32),
            );
        }
    }
    for (bit, relay) in [(2u8, "b3"), (3, "b4")] {
        if mask.bit(bit) {
            doc.push(
                Group::Modules,
                Record::new(
                    format!("emr_{relay}_relay"),
                    if state.bit(bit) { "NC" } else { "NO" },
                ),
            );
        }
    }
    Ok(())
}

/// Sensor model behind an EM ACW/THW mask. A mask of exactly `0x03` marks
/// the THW 100; otherwise temperature (bit 0) and RTD temperature (bit 4)
/// identify it.
pub fn one_wire_model(mask: u8) -> &'static str {
    let model = if mask == 0x03 {
        0x06
    } else {
        (mask & 0x01) | ((mask >> 4 & 0x01) << 1)
    };
    match model {
        0x01 => "em_thw_200",
        0x02 => "em_acw_100",
        0x03 => "em_thw_201",
        0x06 => "em_thw_100",
        _ => "unknown",
    }
}

fn decode_one_wire(
    mask: &mut MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    let prefix = one_wire_model(mask.value() as u8);
    let rom = cursor.read_rom_reversed()?;
    for (presence, field) in ONE_WIRE {
        if presence.eval(mask) {
            field.apply(format!("{prefix}_{}_{rom}", field.name), cursor, doc)?;
        }
    }
    Ok(())
}

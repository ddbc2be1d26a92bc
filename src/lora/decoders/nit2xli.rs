//! NIT 20LI / NIT 21LI environmental node decoder
//!
//! Ports 3 and 4 carry sensor uplinks:
//!
//! ```text
//! [internal mask] [extended internal mask]? [external mask] fields... probes... modules...
//! ```
//!
//! The extended internal mask is present only when bit 7 of the internal
//! mask is set. The external mask announces the dry contacts (bits 0..3),
//! the number of DS18B20 probes (bits 4..6) and whether probes are named by
//! full ROM identifier (bit 7). Extension modules follow until the payload
//! ends. Multi-byte node fields are little-endian.
//!
//! Port 1 echoes the device configuration after a configuration downlink.

use crate::constants::{NIT2XLI_CONFIG_PORT, NIT2XLI_PORTS};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::lora::decoders::extension;
use crate::payload::cursor::{ByteCursor, Endian};
use crate::payload::data_encoding::{kelvin_to_celsius, linear, EnumTable};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Codec, Field, Presence, Step};

const INTERNAL: &[Step] = &[
    Step::Field(
        Presence::Bit(2),
        Field::new(
            Group::Device,
            "firmware_version",
            Codec::FirmwarePacked(Endian::Little),
        ),
    ),
    Step::Flag {
        bit: Presence::Bit(5),
        group: Group::Device,
        name: "power",
        on: "external",
        off: "battery",
    },
    Step::Field(
        Presence::Bit(3),
        Field::new(
            Group::InternalSensors,
            "temperature",
            Codec::kelvin(2, 100.0, 2).le(),
        )
        .unit("C"),
    ),
    Step::Field(
        Presence::Bit(4),
        Field::new(Group::InternalSensors, "humidity", Codec::scaled(2, 10.0, 2).le()).unit("%"),
    ),
];

const DRY_STATE: Codec = Codec::Boolean {
    on: "closed",
    off: "open",
};

const DRYS: &[Step] = &[
    Step::Field(
        Presence::Bit(0),
        Field::new(Group::Drys, "c1_state", DRY_STATE).unit("boolean"),
    ),
    Step::Field(
        Presence::Bit(1),
        Field::new(Group::Drys, "c1_count", Codec::unsigned(2).le()),
    ),
    Step::Field(
        Presence::Bit(2),
        Field::new(Group::Drys, "c2_state", DRY_STATE).unit("boolean"),
    ),
    Step::Field(
        Presence::Bit(3),
        Field::new(Group::Drys, "c2_count", Codec::unsigned(2).le()),
    ),
];

const BATTERY_BIT: u8 = 0;
const EXTENDED_BATTERY_BIT: u8 = 6;
const EXTENDED_MASK_BIT: u8 = 7;
const ENV_SENSOR_FAIL_BIT: u8 = 0;
const PROBE_ROM_BIT: u8 = 7;

const STATUS_ENABLE: EnumTable = EnumTable::new("NIT 2xLI enable flag", &["disable", "enable"]);

const REGION: EnumTable = EnumTable::new(
    "LoRaWAN region",
    &[
        "AS923", "AU915", "CN470", "CN779", "EU433", "EU868", "KR920", "IN865", "US915", "RU864",
        "LA915",
    ],
);

const LORAWAN_CONFIG: &[Step] = &[
    Step::Field(
        Presence::Bit(4),
        Field::new(Group::Lorawan, "adr", Codec::Enum(&STATUS_ENABLE)),
    ),
    Step::Field(
        Presence::Bit(7),
        Field::new(Group::Lorawan, "region", Codec::Enum(&REGION)),
    ),
    Step::Field(
        Presence::Bit(9),
        Field::new(Group::Lorawan, "confirmed_message", Codec::Enum(&STATUS_ENABLE)),
    ),
];

const DELTA_CONFIG: &[Step] = &[Step::Fields(
    Presence::Bit(0),
    &[
        Field::new(Group::Device, "delta_enable", Codec::Enum(&STATUS_ENABLE)).unit("bool"),
        Field::new(Group::Device, "delta_internal_temp", Codec::scaled(1, 10.0, 1)).unit("C"),
        Field::new(Group::Device, "delta_internal_humi", Codec::scaled(1, 10.0, 1)).unit("%"),
        Field::new(Group::Device, "delta_probe_temp", Codec::scaled(1, 10.0, 1)).unit("C"),
    ],
)];

/// Time report used by the device when configured as zero.
const DEFAULT_TIME_REPORT: u32 = 30;

fn model(f_port: u8) -> &'static str {
    if f_port == NIT2XLI_PORTS[1] {
        "NIT 20LI"
    } else {
        "NIT 21LI"
    }
}

fn decode_battery(
    internal: &MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    if !internal.bit(BATTERY_BIT) {
        return Ok(());
    }
    let raw = cursor.read_u8()? as f64;
    let volts = if internal.bit(EXTENDED_BATTERY_BIT) {
        linear(raw, 120.0, 1.0, 2)
    } else {
        linear(raw, 10.0, 0.0, 1)
    };
    doc.push(
        Group::InternalSensors,
        Record::new("battery", volts).with_unit("V"),
    );
    Ok(())
}

/// DS18B20 probes: temperature followed by the probe's identifier, either
/// the full ROM or a one-byte index.
fn decode_probes(
    external: &MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    for _ in 0..external.field(4, 3) {
        let celsius = kelvin_to_celsius(cursor.read_u16_le()? as f64, 100.0, 2);
        let id = if external.bit(PROBE_ROM_BIT) {
            cursor.read_rom_reversed()?
        } else {
            cursor.read_u8()?.to_string()
        };
        doc.push(
            Group::Probes,
            Record::new(format!("temperature_{id}"), celsius).with_unit("C"),
        );
    }
    Ok(())
}

fn decode_uplink(frame: &Frame<'_>, doc: &mut Document) -> Result<(), DecodeError> {
    let mut cursor = ByteCursor::new(frame.bytes);
    helpers::push_model(doc, model(frame.f_port));

    let mut internal = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;
    let extended = if internal.bit(EXTENDED_MASK_BIT) {
        MaskReader::read(&mut cursor, MaskWidth::Bits8)?
    } else {
        MaskReader::empty(MaskWidth::Bits8)
    };
    let mut external = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;

    if extended.bit(ENV_SENSOR_FAIL_BIT) {
        doc.push(Group::Device, Record::new("env_sensor_status", "fail"));
    }

    decode_battery(&internal, &mut cursor, doc)?;
    schema::run(INTERNAL, &mut cursor, &mut internal, doc)?;
    schema::run(DRYS, &mut cursor, &mut external, doc)?;
    decode_probes(&external, &mut cursor, doc)?;
    extension::decode_chain(&mut cursor, doc)?;

    helpers::finish(&cursor, "nit2xli");
    Ok(())
}

fn decode_configuration(frame: &Frame<'_>, doc: &mut Document) -> Result<(), DecodeError> {
    let mut cursor = ByteCursor::new(frame.bytes);
    let mut lorawan = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;
    let mut device = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;

    if lorawan.bit(0) {
        let seconds = match cursor.read_u16()? as u32 * 60 {
            0 => DEFAULT_TIME_REPORT,
            seconds => seconds,
        };
        doc.push(
            Group::Lorawan,
            Record::new("time_report", seconds).with_unit("seconds"),
        );
    }
    schema::run(LORAWAN_CONFIG, &mut cursor, &mut lorawan, doc)?;

    schema::run(DELTA_CONFIG, &mut cursor, &mut device, doc)?;

    if device.bit(1) {
        let dry = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;
        for (bit, name) in [(0u8, "dry1_behavior"), (1, "dry2_behavior")] {
            let behavior = if dry.bit(bit) { "high_frequency" } else { "event" };
            doc.push(Group::Device, Record::new(name, behavior));
        }
        for (bit, name) in [(2u8, "dry1_send_periodic"), (3, "dry2_send_periodic")] {
            let periodic = if dry.bit(bit) { "enable" } else { "disable" };
            doc.push(Group::Device, Record::new(name, periodic));
        }
    }

    if device.bit(2) {
        let emc = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;
        for channel in 0..4u8 {
            if emc.bit(channel) {
                doc.push(
                    Group::Modules,
                    Record::new(format!("emc_e{}", channel + 1), "enable"),
                );
            }
        }
        for (bit, stat) in [(5u8, "min"), (6, "max"), (7, "avg")] {
            let state = if emc.bit(bit) { "enable" } else { "disable" };
            doc.push(Group::Modules, Record::new(format!("emc_{stat}"), state));
        }
        let calibrated = if cursor.read_u8()? != 0 {
            "calibrated"
        } else {
            "not_calibrated"
        };
        doc.push(Group::Device, Record::new("emc_calibration", calibrated));
    }

    helpers::finish(&cursor, "nit2xli");
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Nit2xliDecoder;

impl UplinkDecoder for Nit2xliDecoder {
    fn family(&self) -> Family {
        Family::Nit2xli
    }

    fn ports(&self) -> &'static [u8] {
        &NIT2XLI_PORTS
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut doc = Document::new();
        if frame.f_port == NIT2XLI_CONFIG_PORT {
            decode_configuration(frame, &mut doc)?;
        } else {
            decode_uplink(frame, &mut doc)?;
        }
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

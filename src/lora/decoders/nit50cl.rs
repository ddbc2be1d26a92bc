//! NIT 50CL five-input counter node decoder
//!
//! `[version][data mask:16][inputs config:16]`. The inputs configuration
//! holds one 3-bit operating mode per input: bit 0 dry contact, bit 1 pulse
//! counter, bit 2 counter time. It decides which per-input values follow.

use crate::constants::{DECODER_VERSION_1, NIT50CL_PORT};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::EnumTable;
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Codec, Field, Presence, Step};

const INPUTS: u8 = 5;

const MODE_DRY: u32 = 0x01;
const MODE_COUNTER: u32 = 0x02;
const MODE_COUNTER_TIME: u32 = 0x04;

const OPERATION_MODE: EnumTable = EnumTable::new(
    "NIT 50CL input mode",
    &[
        "disable",
        "dry",
        "counter",
        "dry with counter",
        "counter time",
        "dry with counter time",
        "counter and counter time",
        "dry with counter and counter time",
    ],
);

const HEAD: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Sensors,
        name: "power_source",
        on: "external",
        off: "battery",
    },
    Step::Field(
        Presence::NextBit,
        Field::new(
            Group::Sensors,
            "battery_voltage",
            Codec::offset(1, 100.0, 1.0, 2),
        )
        .unit("V"),
    ),
    Step::FieldOr(
        Presence::NextBit,
        Field::new(Group::Sensors, "buffered_events", Codec::unsigned(1)),
        0.0,
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "uplink_interval", Codec::unsigned(2)).unit("minutes"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "debounce_time", Codec::scaled(2, 0.1, 0)).unit("ms"),
    ),
];

const SETTINGS: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "pwm_duty", Codec::unsigned(1)).unit("%"),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Sensors,
        name: "enable_fifo_event",
        on: "true",
        off: "false",
    },
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Sensors,
        name: "send_at_event",
        on: "true",
        off: "false",
    },
];

fn input_mode(config: &MaskReader, index: u8) -> u32 {
    config.field(index * 3, 3)
}

#[derive(Debug, Clone, Default)]
pub struct Nit50clDecoder;

impl UplinkDecoder for Nit50clDecoder {
    fn family(&self) -> Family {
        Family::Nit50cl
    }

    fn ports(&self) -> &'static [u8] {
        &[NIT50CL_PORT]
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        helpers::read_decoder_version(&mut cursor, "nit50cl", &[DECODER_VERSION_1])?;
        helpers::push_model(&mut doc, "NIT 50CL");

        let mut mask = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;
        let config = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;

        schema::run(HEAD, &mut cursor, &mut mask, &mut doc)?;

        for index in 0..INPUTS {
            let mode = OPERATION_MODE.lookup(input_mode(&config, index))?;
            doc.push(
                Group::Sensors,
                Record::new(format!("in{}_op_mode", index + 1), mode),
            );
        }

        if mask.next_bit() {
            let status = MaskReader::new(cursor.read_u8()? as u32 & 0x1F, MaskWidth::Bits8);
            for index in 0..INPUTS {
                if input_mode(&config, index) & MODE_DRY != 0 {
                    let state = if status.bit(index) { "closed" } else { "open" };
                    doc.push(
                        Group::Sensors,
                        Record::new(format!("in{}", index + 1), state),
                    );
                }
            }
        }

        schema::run(SETTINGS, &mut cursor, &mut mask, &mut doc)?;

        let alarm = mask.next_bit();
        doc.push(
            Group::Sensors,
            Record::new("input_alarm", if alarm { "enabled" } else { "disabled" }),
        );
        let timeout = if alarm {
            Record::new("input_alarm_timeout", cursor.read_u16()? as u32)
        } else {
            Record::new("input_alarm_timeout", "N/A")
        };
        doc.push(Group::Sensors, timeout.with_unit("seconds"));

        for index in 0..INPUTS {
            if input_mode(&config, index) & MODE_COUNTER != 0 {
                doc.push(
                    Group::Sensors,
                    Record::new(format!("counter_in{}", index + 1), cursor.read_u24()?),
                );
            }
        }
        for index in 0..INPUTS {
            if input_mode(&config, index) & MODE_COUNTER_TIME != 0 {
                doc.push(
                    Group::Sensors,
                    Record::new(format!("counter_time_in{}", index + 1), cursor.read_u24()?)
                        .with_unit("seconds"),
                );
            }
        }

        helpers::finish(&cursor, "nit50cl");
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

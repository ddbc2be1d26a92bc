//! ITP 200 / ITP 202 street lighting controller decoder
//!
//! `[version][mask:8]` where the outer mask announces up to four sub-masks:
//! status (16 bits), sensor (16 bits), alert (16 bits) and error (8 bits).
//! Every announced sub-mask is read before any body, then the status and
//! sensor bodies follow in that order. Alerts and errors carry no body.

use crate::constants::{DECODER_VERSION_1, ITP200_PORTS};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::EnumTable;
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Codec, Field, Presence, Step};

const OPERATION_MODE: EnumTable = EnumTable::new(
    "ITP 200 operation mode",
    &["manual", "automatic", "slot", "sunriset"],
);

const STATUS: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "dimmer", Codec::unsigned(1)).unit("%"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "operation_mode", Codec::Enum(&OPERATION_MODE)),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "slot_running", Codec::unsigned(1)),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Status,
        name: "light_state",
        on: "on",
        off: "off",
    },
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "relay_switching_counter", Codec::unsigned(4)).unit("counter"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "relay_active_time", Codec::unsigned(4)).unit("sec"),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Status,
        name: "coordinates_fixed",
        on: "fixed",
        off: "not_fixed",
    },
];

const SENSORS: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "temperature", Codec::offset(1, 2.0, -15.0, 1)).unit("C"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "ambient_light", Codec::unsigned(2)).unit("lux"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "angle", Codec::scaled(1, 2.5, 1)).unit("degree"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "frequency", Codec::offset(1, 10.0, 45.0, 1)).unit("Hz"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "pwr_factor", Codec::offset(1, 100.0, -1.0, 2)).unit("/"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "voltage", Codec::scaled(2, 10.0, 1)).unit("V"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "current", Codec::scaled(2, 1000.0, 3)).unit("A"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "active_energy", Codec::unsigned(4)).unit("Wh"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "reactive_energy", Codec::unsigned(4)).unit("VArh"),
    ),
    Step::Fields(
        Presence::NextBit,
        &[
            Field::new(
                Group::Sensors,
                "latitude",
                Codec::offset(4, 1_000_000.0, -90.0, 6),
            )
            .unit("DD"),
            Field::new(
                Group::Sensors,
                "longitude",
                Codec::offset(4, 1_000_000.0, -180.0, 6),
            )
            .unit("DD"),
        ],
    ),
];

const ALERTS: &[Step] = &[Step::BitLabels {
    group: Group::Alerts,
    names: &[
        "pin_changed",
        "over_current",
        "under_voltage",
        "over_voltage",
        "under_temperature",
        "over_temperature",
        "over_angle",
        "soft_reset",
        "hard_reset",
        "acc_energy_reset",
        "poss_pwr_fail",
        "no_load_detec",
        "pwr_alarm",
        "max_relay_act",
    ],
    value: "alert",
}];

const ERRORS: &[Step] = &[Step::BitLabels {
    group: Group::Errors,
    names: &[
        "power_meter_err",
        "ambient_light_err",
        "accelerometer_err",
        "gps_err",
    ],
    value: "error",
}];

fn model(f_port: u8) -> &'static str {
    if f_port == ITP200_PORTS[0] {
        "ITP 200"
    } else {
        "ITP 202"
    }
}

/// Read the sub-mask behind the outer mask's running bit, if announced.
fn sub_mask(
    outer: &mut MaskReader,
    cursor: &mut ByteCursor<'_>,
    width: MaskWidth,
) -> Result<Option<MaskReader>, DecodeError> {
    if outer.next_bit() {
        MaskReader::read(cursor, width).map(Some)
    } else {
        Ok(None)
    }
}

fn decode_status(
    mask: &mut MaskReader,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    schema::run(STATUS, cursor, mask, doc)?;

    // The timestamp is only sent by a synchronized clock.
    let synchronized = mask.next_bit();
    let has_timestamp = mask.next_bit();
    if synchronized && has_timestamp {
        doc.push(
            Group::Status,
            Record::new("timestamp", cursor.read_u32()?).with_unit("sec"),
        );
    }
    doc.push(
        Group::Status,
        Record::new(
            "timestamp_sync",
            if synchronized {
                "syncronized"
            } else {
                "not_syncronized"
            },
        ),
    );
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Itp200Decoder;

impl UplinkDecoder for Itp200Decoder {
    fn family(&self) -> Family {
        Family::Itp200
    }

    fn ports(&self) -> &'static [u8] {
        &ITP200_PORTS
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        helpers::read_decoder_version(&mut cursor, "itp200", &[DECODER_VERSION_1])?;
        helpers::push_model(&mut doc, model(frame.f_port));

        let mut outer = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;
        let status = sub_mask(&mut outer, &mut cursor, MaskWidth::Bits16)?;
        let sensors = sub_mask(&mut outer, &mut cursor, MaskWidth::Bits16)?;
        let alerts = sub_mask(&mut outer, &mut cursor, MaskWidth::Bits16)?;
        let errors = sub_mask(&mut outer, &mut cursor, MaskWidth::Bits8)?;

        if let Some(mut mask) = status {
            decode_status(&mut mask, &mut cursor, &mut doc)?;
        }
        if let Some(mut mask) = sensors {
            schema::run(SENSORS, &mut cursor, &mut mask, &mut doc)?;
        }
        if let Some(mut mask) = alerts {
            schema::run(ALERTS, &mut cursor, &mut mask, &mut doc)?;
        }
        if let Some(mut mask) = errors {
            schema::run(ERRORS, &mut cursor, &mut mask, &mut doc)?;
        }

        helpers::finish(&cursor, "itp200");
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

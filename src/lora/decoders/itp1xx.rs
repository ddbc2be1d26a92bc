//! ITP 100 / ITP 111 street lighting controller decoder
//!
//! The first two bytes select the frame kind:
//!
//! - `4C 01` periodic report: firmware at bytes 2..3, a 32-bit mask at
//!   byte 4, then the masked readings. Bits 14..21 of the mask carry status
//!   values directly.
//! - `4B 02` .. `4B 05` alarm frames with a fixed body.

use crate::constants::{ITP1XX_ALARM_HEADER, ITP1XX_PORTS, ITP1XX_REPORT_HEADER};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::{bcd_firmware_swapped, EnumTable};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Codec, Field, Presence, Step};

const OPERATION_MODE: EnumTable = EnumTable::new(
    "ITP 1xx operation mode",
    &["manual", "automatic", "slot", "error"],
);

const ALARM_TILT: u8 = 0x02;
const ALARM_POWER: u8 = 0x03;
const ALARM_REPORT: u8 = 0x04;
const ALARM_LIGHT: u8 = 0x05;

const REPORT_FAILURES: [&str; 4] = [
    "Power Meter FAIL",
    "Lux Sensor FAIL",
    "GPS Sensor FAIL",
    "Accelerometer Sensor FAIL",
];

const REPORT: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "voltage", Codec::scaled(2, 10.0, 1)).unit("V"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "current", Codec::scaled(3, 10000.0, 3)).unit("A"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "pwr_factor", Codec::scaled(2, 1000.0, 3)).unit("/"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "frequency", Codec::scaled(2, 1000.0, 3)).unit("Hz"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "temperature", Codec::kelvin(2, 100.0, 2)).unit("C"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "ambient_light", Codec::unsigned(2)).unit("lux"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "angle", Codec::scaled(2, 100.0, 2)).unit("degree"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "swing_duty", Codec::scaled(2, 100.0, 2)).unit("%"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "standard_deviation", Codec::scaled(2, 100.0, 2)).unit("%"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "active_energy", Codec::scaled(7, 1_000_000.0, 6)).unit("kWh"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "reactive_energy", Codec::scaled(7, 1_000_000.0, 6))
            .unit("kVArh"),
    ),
    Step::Fields(
        Presence::NextBit,
        &[
            Field::new(Group::Sensors, "latitude", Codec::LatLon).unit("DD"),
            Field::new(Group::Sensors, "longitude", Codec::LatLon).unit("DD"),
        ],
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "dimmer", Codec::unsigned(1)).unit("%"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Status, "last_commutation", Codec::unsigned(2)).unit("sec"),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Status,
        name: "light_state",
        on: "on",
        off: "off",
    },
];

fn model(f_port: u8) -> &'static str {
    if f_port == ITP1XX_PORTS[0] {
        "ITP 100"
    } else {
        "ITP 111"
    }
}

fn decode_report(cursor: &mut ByteCursor<'_>, doc: &mut Document) -> Result<(), DecodeError> {
    let firmware = cursor.take(2)?;
    doc.push(
        Group::Device,
        Record::new(
            "firmware_version",
            bcd_firmware_swapped(firmware[0], firmware[1]),
        ),
    );

    let mut mask = MaskReader::read(cursor, MaskWidth::Bits32)?;
    schema::run(REPORT, cursor, &mut mask, doc)?;

    doc.push(
        Group::Status,
        Record::new("operation_mode", OPERATION_MODE.lookup(mask.field(16, 2))?),
    );
    doc.push(
        Group::Status,
        Record::new(
            "rtc",
            if mask.bit(18) {
                "syncronized"
            } else {
                "not syncronized"
            },
        ),
    );
    if mask.bit(19) {
        doc.push(
            Group::Status,
            Record::new("timestamp", cursor.read_u32()?).with_unit("sec"),
        );
    }
    let slot = match mask.field(20, 2) {
        3 => Record::new("slot_running", "none"),
        slot => Record::new("slot_running", slot),
    };
    doc.push(Group::Status, slot);
    Ok(())
}

fn decode_alarm(
    kind: u8,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    match kind {
        ALARM_TILT => doc.push(
            Group::Status,
            Record::new("alarm_message", "TILT Alarm Event!"),
        ),
        ALARM_POWER => doc.push(
            Group::Status,
            Record::new("alarm_message", "Power Alarm Event!"),
        ),
        ALARM_REPORT => {
            let failures = MaskReader::read(cursor, MaskWidth::Bits8)?;
            let mut message = String::from("Report Alarm Event!");
            for (bit, failure) in REPORT_FAILURES.iter().enumerate() {
                if failures.bit(bit as u8) {
                    message.push(' ');
                    message.push_str(failure);
                }
            }
            doc.push(Group::Status, Record::new("error_message", message));
        }
        ALARM_LIGHT => {
            let state = cursor.read_u8()?;
            doc.push(
                Group::Status,
                Record::new("light_state", if state & 0x01 != 0 { "on" } else { "off" }),
            );
            doc.push(
                Group::Status,
                Record::new("event_time", cursor.read_u32()?).with_unit("sec"),
            );
        }
        _ => {
            return Err(DecodeError::UnknownEnumValue {
                table: "ITP 1xx frame header",
                value: u32::from(ITP1XX_ALARM_HEADER) << 8 | kind as u32,
            })
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Itp1xxDecoder;

impl UplinkDecoder for Itp1xxDecoder {
    fn family(&self) -> Family {
        Family::Itp1xx
    }

    fn ports(&self) -> &'static [u8] {
        &ITP1XX_PORTS
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();
        helpers::push_model(&mut doc, model(frame.f_port));

        let header = cursor.take(2)?;
        match header {
            [first, second] if [*first, *second] == ITP1XX_REPORT_HEADER => {
                decode_report(&mut cursor, &mut doc)?
            }
            [ITP1XX_ALARM_HEADER, kind] => decode_alarm(*kind, &mut cursor, &mut doc)?,
            _ => {
                return Err(DecodeError::UnknownEnumValue {
                    table: "ITP 1xx frame header",
                    value: (header[0] as u32) << 8 | header[1] as u32,
                })
            }
        }

        helpers::finish(&cursor, "itp1xx");
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::record::Value;

    fn status(doc: &Document, name: &str) -> Value {
        doc.find(Group::Status, name).unwrap().value.clone()
    }

    #[test]
    fn test_report_with_coordinates() {
        let payload = [
            0x4C, 0x01, // report
            0x21, 0x43, // firmware 3.4.1.2
            0x00, 0x1D, 0x48, 0x01, // mask: 0, 11, 14, 16, 18, 19, 20
            0x08, 0xFC, // 230.0 V
            0x80, 0x00, 0x00, 0x01, // latitude -0.000001
            0x02, 0xFA, 0xF0, 0x80, // longitude 50.0
            0x65, 0x00, 0x00, 0x00, // timestamp
        ];
        let doc = Itp1xxDecoder.decode(&Frame::new(&payload, 5)).unwrap();

        assert_eq!(
            doc.find(Group::Device, "model").unwrap().value,
            Value::Label("ITP 100")
        );
        assert_eq!(
            doc.find(Group::Device, "firmware_version").unwrap().value,
            Value::Text("3.4.1.2".to_string())
        );
        assert_eq!(doc.number(Group::Sensors, "voltage"), Some(230.0));
        assert_eq!(doc.number(Group::Sensors, "latitude"), Some(-0.000001));
        assert_eq!(doc.number(Group::Sensors, "longitude"), Some(50.0));
        assert_eq!(status(&doc, "light_state"), Value::Label("on"));
        assert_eq!(status(&doc, "operation_mode"), Value::Label("automatic"));
        assert_eq!(status(&doc, "rtc"), Value::Label("syncronized"));
        assert_eq!(doc.number(Group::Status, "timestamp"), Some(1_694_498_816.0));
        assert_eq!(doc.number(Group::Status, "slot_running"), Some(1.0));
    }

    #[test]
    fn test_report_slot_none() {
        let payload = [0x4C, 0x01, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00];
        let doc = Itp1xxDecoder.decode(&Frame::new(&payload, 8)).unwrap();
        assert_eq!(status(&doc, "slot_running"), Value::Label("none"));
        assert_eq!(status(&doc, "light_state"), Value::Label("off"));
        assert_eq!(status(&doc, "rtc"), Value::Label("not syncronized"));
    }

    #[test]
    fn test_alarm_frames() {
        let doc = Itp1xxDecoder
            .decode(&Frame::new(&[0x4B, 0x02], 5))
            .unwrap();
        assert_eq!(status(&doc, "alarm_message"), Value::Label("TILT Alarm Event!"));

        let doc = Itp1xxDecoder
            .decode(&Frame::new(&[0x4B, 0x04, 0b0101], 5))
            .unwrap();
        assert_eq!(
            status(&doc, "error_message"),
            Value::Text("Report Alarm Event! Power Meter FAIL GPS Sensor FAIL".to_string())
        );

        let doc = Itp1xxDecoder
            .decode(&Frame::new(&[0x4B, 0x05, 0x01, 0x00, 0x00, 0x00, 0x3C], 8))
            .unwrap();
        assert_eq!(status(&doc, "light_state"), Value::Label("on"));
        assert_eq!(doc.number(Group::Status, "event_time"), Some(60.0));
    }

    #[test]
    fn test_unknown_header() {
        assert_eq!(
            Itp1xxDecoder
                .decode(&Frame::new(&[0x4B, 0x09], 5))
                .unwrap_err(),
            DecodeError::UnknownEnumValue {
                table: "ITP 1xx frame header",
                value: 0x4B09
            }
        );
        assert_eq!(
            Itp1xxDecoder
                .decode(&Frame::new(&[0x10, 0x01], 5))
                .unwrap_err(),
            DecodeError::UnknownEnumValue {
                table: "ITP 1xx frame header",
                value: 0x1001
            }
        );
    }
}

//! ITC 100 water meter pulse counter
//!
//! Fixed layout, no version byte and no mask:
//!
//! ```text
//! [mode][status][battery][firmware:16][flux_a:32] ( [flux_b:32][flux_c:32] | [reflux:16] )
//! ```
//!
//! The status byte packs the message type (bits 7..6), fraud (bit 5),
//! tamper (bit 4) and the meter resolution exponent (bits 2..1).

use crate::constants::ITC100_PORT;
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::{decimal_firmware, linear, EnumTable};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};

const OPERATION_MODE: EnumTable = EnumTable::starting_at(
    "ITC 100 operation mode",
    0x49,
    &["single_mode", "multi_mode", "digital_reflux_mode"],
);

const MESSAGE_TYPE: EnumTable = EnumTable::new(
    "ITC 100 message type",
    &[
        "normal_report",
        "fraud_report",
        "tamper_fraud_report",
        "ack_configuration",
    ],
);

const MULTI_MODE: u8 = 0x4A;

#[derive(Debug, Clone, Default)]
pub struct Itc100Decoder;

impl UplinkDecoder for Itc100Decoder {
    fn family(&self) -> Family {
        Family::Itc100
    }

    fn ports(&self) -> &'static [u8] {
        &[ITC100_PORT]
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();
        helpers::push_model(&mut doc, "ITC 100");

        let mode = cursor.read_u8()?;
        doc.push(
            Group::Sensors,
            Record::new("operation_mode", OPERATION_MODE.lookup(mode as u32)?),
        );

        let status = MaskReader::read(&mut cursor, MaskWidth::Bits8)?;
        doc.push(
            Group::Sensors,
            Record::new("message_type", MESSAGE_TYPE.lookup(status.field(6, 2))?),
        );
        doc.push(
            Group::Sensors,
            Record::new(
                "fraud",
                if status.bit(5) { "fraud_detected" } else { "no_fraud" },
            ),
        );
        doc.push(
            Group::Sensors,
            Record::new(
                "tamper",
                if status.bit(4) { "tamper_open" } else { "tamper_closed" },
            ),
        );
        let resolution = match status.field(1, 2) {
            0 => Record::new("resolution", "not_configured"),
            expo => Record::new("resolution", 10f64.powi(expo as i32 - 1)),
        };
        doc.push(Group::Sensors, resolution.with_unit("L/pulse"));

        let battery = linear(cursor.read_u8()? as f64, 10.0, 0.0, 1);
        doc.push(
            Group::Sensors,
            Record::new("battery_voltage", battery).with_unit("V"),
        );

        doc.push(
            Group::Device,
            Record::new("firmware_version", decimal_firmware(cursor.read_u16()?)),
        );

        doc.push(
            Group::Sensors,
            Record::new("pulse_count_flux_a", cursor.read_u32()?),
        );
        if mode == MULTI_MODE {
            doc.push(
                Group::Sensors,
                Record::new("pulse_count_flux_b", cursor.read_u32()?),
            );
            doc.push(
                Group::Sensors,
                Record::new("pulse_count_flux_c", cursor.read_u32()?),
            );
        } else {
            doc.push(
                Group::Sensors,
                Record::new("pulse_count_reflux", cursor.read_u16()? as u32),
            );
        }

        helpers::finish(&cursor, "itc100");
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

    fn label(doc: &Document, name: &str) -> Value {
        doc.find(Group::Sensors, name).unwrap().value.clone()
    }

    #[test]
    fn test_single_mode_report() {
        let payload = [
            0x49, // single_mode
            0b0110_0100, // fraud_report, fraud, no tamper, expo 2
            36,   // 3.6 V
            0x04, 0xD2, // firmware 1234
            0x00, 0x00, 0x01, 0x00, // flux a
            0x00, 0x05, // reflux
        ];
        let doc = Itc100Decoder.decode(&Frame::new(&payload, 9)).unwrap();

        assert_eq!(label(&doc, "operation_mode"), Value::Label("single_mode"));
        assert_eq!(label(&doc, "message_type"), Value::Label("fraud_report"));
        assert_eq!(label(&doc, "fraud"), Value::Label("fraud_detected"));
        assert_eq!(label(&doc, "tamper"), Value::Label("tamper_closed"));
        assert_eq!(doc.number(Group::Sensors, "resolution"), Some(10.0));
        assert_eq!(doc.number(Group::Sensors, "battery_voltage"), Some(3.6));
        assert_eq!(
            doc.find(Group::Device, "firmware_version").unwrap().value,
            Value::Text("1.2.3.4".to_string())
        );
        assert_eq!(doc.number(Group::Sensors, "pulse_count_flux_a"), Some(256.0));
        assert_eq!(doc.number(Group::Sensors, "pulse_count_reflux"), Some(5.0));
        assert!(doc.find(Group::Sensors, "pulse_count_flux_b").is_none());
    }

    #[test]
    fn test_multi_mode_reads_three_counters() {
        let payload = [
            0x4A, 0b0001_0000, 30, 0x00, 0x64, // mode, tamper open, 3.0 V, fw 100
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
        ];
        let doc = Itc100Decoder.decode(&Frame::new(&payload, 9)).unwrap();

        assert_eq!(label(&doc, "tamper"), Value::Label("tamper_open"));
        assert_eq!(label(&doc, "resolution"), Value::Label("not_configured"));
        assert_eq!(doc.number(Group::Sensors, "pulse_count_flux_c"), Some(3.0));
        assert!(doc.find(Group::Sensors, "pulse_count_reflux").is_none());
    }

    #[test]
    fn test_unknown_mode() {
        let payload = [0x10, 0x00];
        assert_eq!(
            Itc100Decoder.decode(&Frame::new(&payload, 9)).unwrap_err(),
            DecodeError::UnknownEnumValue {
                table: "ITC 100 operation mode",
                value: 0x10
            }
        );
    }
}

//! NIT 10LA air quality node decoder

use crate::constants::{DECODER_VERSION_1, NIT10LA_PORT};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::EnumTable;
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group};
use crate::payload::schema::{self, Codec, Field, Presence, Step};

const AIR_QUALITY_INDEX: EnumTable = EnumTable::new(
    "air quality index",
    &["good", "moderate", "unhealty", "very_unhealty", "hazardous"],
);

const SCHEMA: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "temperature", Codec::scaled(2, 10.0, 1)).unit("C"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "humidity", Codec::scaled(2, 10.0, 1)).unit("%"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "pm2_5", Codec::unsigned(2)).unit("ug/m^3"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "noise", Codec::scaled(2, 10.0, 1)).unit("dB"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(
            Group::Sensors,
            "air_quality_index_pm2_5",
            Codec::Enum(&AIR_QUALITY_INDEX),
        ),
    ),
];

#[derive(Debug, Clone, Default)]
pub struct Nit10laDecoder;

impl UplinkDecoder for Nit10laDecoder {
    fn family(&self) -> Family {
        Family::Nit10la
    }

    fn ports(&self) -> &'static [u8] {
        &[NIT10LA_PORT]
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        helpers::read_decoder_version(&mut cursor, "nit10la", &[DECODER_VERSION_1])?;
        helpers::push_model(&mut doc, "NIT 10LA");

        let mut mask = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;
        schema::run(SCHEMA, &mut cursor, &mut mask, &mut doc)?;

        helpers::finish(&cursor, "nit10la");
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

    #[test]
    fn test_decode_full_report() {
        let payload = [
            0x01, // decoder version
            0x00, 0x3F, // all six fields
            0x10, 0x02, // firmware 1.0.0.2
            0x00, 0xEB, // 23.5 C
            0x02, 0x26, // 55.0 %
            0x00, 0x0C, // 12 ug/m^3
            0x01, 0xA4, // 42.0 dB
            0x01, // moderate
        ];
        let doc = Nit10laDecoder.decode(&Frame::new(&payload, 21)).unwrap();

        assert_eq!(
            doc.find(Group::Device, "firmware_version").unwrap().value,
            Value::Text("1.0.0.2".to_string())
        );
        assert_eq!(doc.number(Group::Sensors, "temperature"), Some(23.5));
        assert_eq!(doc.number(Group::Sensors, "humidity"), Some(55.0));
        assert_eq!(doc.number(Group::Sensors, "pm2_5"), Some(12.0));
        assert_eq!(doc.number(Group::Sensors, "noise"), Some(42.0));
        assert_eq!(
            doc.find(Group::Sensors, "air_quality_index_pm2_5")
                .unwrap()
                .value,
            Value::Label("moderate")
        );
    }

    #[test]
    fn test_air_quality_out_of_range() {
        let payload = [0x01, 0x00, 0x20, 0x05];
        assert_eq!(
            Nit10laDecoder
                .decode(&Frame::new(&payload, 21))
                .unwrap_err(),
            DecodeError::UnknownEnumValue {
                table: "air quality index",
                value: 5
            }
        );
    }

    #[test]
    fn test_wrong_version() {
        let payload = [0x02, 0x00, 0x00];
        assert_eq!(
            Nit10laDecoder
                .decode(&Frame::new(&payload, 21))
                .unwrap_err(),
            DecodeError::UnsupportedDecoderVersion {
                family: "nit10la",
                version: 2
            }
        );
    }
}

//! ITC 201/204/211/214 pulse counter decoder
//!
//! `[version][mask:24]` then the masked fields. Bit 8 carries no payload; it
//! switches on a pulse width after each flux counter.

use crate::constants::{DECODER_VERSION_1, ITC200_PORTS};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::{round_to, EnumTable};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Affix, Codec, Field, Presence, Repeat, Step};

const OPERATION_MODE: EnumTable = EnumTable::new(
    "ITC 200 operation mode",
    &[
        "Single flux",
        "Single flux and reflux",
        "Single flux and reflux digital",
        "Single flux and reflux quadrature",
        "Dual flux",
        "Dual flux and reflux",
        "Dual flux and reflux digital",
        "Dual flux and reflux quadrature",
        "Triple flux",
        "Quad flux",
    ],
);

const METERS: &[&str] = &["a", "b", "c", "d"];

const PULSE_WIDTH_ACTIVE: u8 = 8;

const HEAD: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "uplink_interval", Codec::unsigned(2)).unit("minutes"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(
            Group::Sensors,
            "battery_voltage",
            Codec::offset(1, 100.0, 1.0, 2),
        )
        .unit("V"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "internal_temperature", Codec::scaled(1, 2.0, 1)).unit("°C"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(
            Group::Sensors,
            "internal_relative_humidity",
            Codec::scaled(1, 2.0, 1),
        )
        .unit("%RH"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "operation_mode", Codec::Enum(&OPERATION_MODE)),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "meter_resolution", Codec::PowerOfTen).unit("L/pulse"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "fraud", Codec::Constant("detected")),
    ),
    Step::Skip(1),
    Step::Repeat(Repeat {
        gate: Presence::Always,
        each: Presence::NextBit,
        labels: METERS,
        affix: Affix::Suffix,
        fields: &[
            (
                Presence::Always,
                Field::new(Group::Sensors, "counter_flux", Codec::unsigned(4)),
            ),
            (
                Presence::Bit(PULSE_WIDTH_ACTIVE),
                Field::new(Group::Sensors, "pulse_width_flux", Codec::scaled(2, 0.1, 0)).unit("ms"),
            ),
        ],
    }),
    Step::Repeat(Repeat {
        gate: Presence::Always,
        each: Presence::NextBit,
        labels: &["a", "b"],
        affix: Affix::Suffix,
        fields: &[(
            Presence::Always,
            Field::new(Group::Sensors, "counter_reflux", Codec::unsigned(4)),
        )],
    }),
];

const TAIL: &[Step] = &[Step::Field(
    Presence::NextBit,
    Field::new(Group::Sensors, "counter_insert", Codec::Constant("alarm")),
)];

fn model(f_port: u8) -> &'static str {
    match f_port {
        16 => "ITC 201",
        17 => "ITC 204",
        18 => "ITC 211",
        _ => "ITC 214",
    }
}

/// `(flux - reflux) * resolution` in cubic metres for every reported flux
/// counter. Meters without a reflux counter subtract nothing.
fn push_total_volume(doc: &mut Document) {
    let Some(resolution) = doc.number(Group::Sensors, "meter_resolution") else {
        return;
    };
    let totals: Vec<Record> = METERS
        .iter()
        .filter_map(|meter| {
            let flux = doc.number(Group::Sensors, &format!("counter_flux_{meter}"))?;
            let reflux = doc
                .number(Group::Sensors, &format!("counter_reflux_{meter}"))
                .unwrap_or(0.0);
            let litres = (flux - reflux) * resolution;
            Some(
                Record::new(format!("total_volume_meter_{meter}"), round_to(litres / 1000.0, 3))
                    .with_unit("m³"),
            )
        })
        .collect();
    for record in totals {
        doc.push(Group::Sensors, record);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Itc200Decoder;

impl UplinkDecoder for Itc200Decoder {
    fn family(&self) -> Family {
        Family::Itc200
    }

    fn ports(&self) -> &'static [u8] {
        &ITC200_PORTS
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        helpers::read_decoder_version(&mut cursor, "itc200", &[DECODER_VERSION_1])?;
        helpers::push_model(&mut doc, model(frame.f_port));

        let mut mask = MaskReader::read(&mut cursor, MaskWidth::Bits24)?;
        schema::run(HEAD, &mut cursor, &mut mask, &mut doc)?;
        push_total_volume(&mut doc);
        schema::run(TAIL, &mut cursor, &mut mask, &mut doc)?;

        helpers::finish(&cursor, "itc200");
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
    fn test_flux_reflux_and_total_volume() {
        let payload = [
            0x01, // version
            0x00, 0xA6, 0x40, // bits 6, 9, 10, 13, 15 (insert alarm)
            0x01, // resolution 10 L/pulse
            0x00, 0x00, 0x03, 0xE8, // flux a = 1000
            0x00, 0x00, 0x00, 0x64, // flux b = 100
            0x00, 0x00, 0x00, 0xC8, // reflux a = 200
        ];
        let doc = Itc200Decoder.decode(&Frame::new(&payload, 17)).unwrap();

        assert_eq!(
            doc.find(Group::Device, "model").unwrap().value,
            Value::Label("ITC 204")
        );
        assert_eq!(doc.number(Group::Sensors, "meter_resolution"), Some(10.0));
        assert_eq!(doc.number(Group::Sensors, "counter_flux_a"), Some(1000.0));
        assert_eq!(doc.number(Group::Sensors, "counter_flux_b"), Some(100.0));
        assert_eq!(doc.number(Group::Sensors, "counter_reflux_a"), Some(200.0));
        assert_eq!(doc.number(Group::Sensors, "total_volume_meter_a"), Some(8.0));
        assert_eq!(doc.number(Group::Sensors, "total_volume_meter_b"), Some(1.0));
        assert!(doc.find(Group::Sensors, "total_volume_meter_c").is_none());

        let names: Vec<&str> = doc
            .group(Group::Sensors)
            .unwrap()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names.last(), Some(&"counter_insert"));
    }

    #[test]
    fn test_pulse_width_follows_each_flux() {
        let payload = [
            0x01, 0x00, 0x03, 0x00, // bits 8, 9
            0x00, 0x00, 0x00, 0x07, // flux a
            0x00, 0x05, // 50 ms
        ];
        let doc = Itc200Decoder.decode(&Frame::new(&payload, 16)).unwrap();
        assert_eq!(doc.number(Group::Sensors, "pulse_width_flux_a"), Some(50.0));
        // no resolution, so no derived volume
        assert!(doc.find(Group::Sensors, "total_volume_meter_a").is_none());
    }

    #[test]
    fn test_status_fields() {
        let payload = [
            0x01, 0x00, 0x00, 0xBF, // bits 0..5 and 7
            0x10, 0x25, // firmware
            0x00, 0x0F, // 15 minutes
            0x96, // 2.5 V
            0x31, // 24.5 °C
            0x64, // 50 %RH
            0x04, // Dual flux
        ];
        let doc = Itc200Decoder.decode(&Frame::new(&payload, 19)).unwrap();
        assert_eq!(doc.number(Group::Device, "uplink_interval"), Some(15.0));
        assert_eq!(doc.number(Group::Sensors, "battery_voltage"), Some(2.5));
        assert_eq!(doc.number(Group::Sensors, "internal_temperature"), Some(24.5));
        assert_eq!(
            doc.find(Group::Sensors, "operation_mode").unwrap().value,
            Value::Label("Dual flux")
        );
        assert_eq!(
            doc.find(Group::Sensors, "fraud").unwrap().value,
            Value::Label("detected")
        );
    }
}

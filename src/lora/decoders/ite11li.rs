//! ITE 11LI three-phase power meter decoder
//!
//! `[version][mask:16]`; bits 0..2 select firmware, temperature and line
//! frequency, bits 3..5 one block per phase, bit 6 the B1 dry contact. The
//! decoder version selects the current scale.

use crate::constants::{DECODER_VERSION_1, DECODER_VERSION_2, ITE11LI_PORT};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::{round_to, EnumTable};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Affix, Codec, Field, Presence, Step};

const PHASES: [&str; 3] = ["phase_a", "phase_b", "phase_c"];
const FIRST_PHASE_BIT: u8 = 3;

const TC_CONFIG: EnumTable = EnumTable::new(
    "ITE 11LI current transformer",
    &[
        "POWCT-T16-150-333",
        "POWCT-T24-250-333",
        "POWCT-T36-630-333",
        "POWCT-T50-1500-333",
        "POWCT-T16-25-333",
        "POWCT-T16-40-333",
        "POWCT-T16-100-333",
    ],
);

const HEAD: &[Step] = &[
    Step::Field(
        Presence::Bit(0),
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Field(
        Presence::Bit(1),
        Field::new(Group::Sensors, "temperature", Codec::scaled(1, 2.0, 1)).unit("C"),
    ),
    Step::Field(
        Presence::Bit(2),
        Field::new(Group::Sensors, "frequency", Codec::offset(1, 10.0, 45.0, 1)).unit("Hz"),
    ),
];

const TAIL: &[Step] = &[Step::Field(
    Presence::Bit(6),
    Field::new(
        Group::Sensors,
        "b1_state",
        Codec::Boolean {
            on: "CLOSED",
            off: "OPEN",
        },
    )
    .unit("bool"),
)];

const fn phase(current: Codec) -> [(Presence, Field); 6] {
    [
        (
            Presence::Always,
            Field::new(Group::Sensors, "voltage", Codec::scaled(2, 10.0, 1)).unit("V"),
        ),
        (
            Presence::Always,
            Field::new(Group::Sensors, "current", current).unit("A"),
        ),
        (
            Presence::Always,
            Field::new(Group::Sensors, "pwr_factor", Codec::offset(1, 100.0, -1.0, 2)).unit("/"),
        ),
        (
            Presence::Always,
            Field::new(Group::Sensors, "active_energy", Codec::scaled(4, 100.0, 2)).unit("kWh"),
        ),
        (
            Presence::Always,
            Field::new(Group::Sensors, "reactive_energy", Codec::scaled(4, 100.0, 2))
                .unit("kVArh"),
        ),
        (
            Presence::Always,
            Field::new(Group::Sensors, "tc_config", Codec::Enum(&TC_CONFIG)),
        ),
    ]
}

const PHASE_V1: &[(Presence, Field)] = &phase(Codec::scaled(2, 1000.0, 3));
const PHASE_V2: &[(Presence, Field)] = &phase(Codec::scaled(2, 20.0, 2));

/// Apparent, active and reactive power from one phase's decoded readings.
fn push_phase_power(doc: &mut Document, label: &str) {
    let reading = |name: &str| {
        doc.number(Group::Sensors, &format!("{label}_{name}"))
            .unwrap_or(0.0)
    };
    let apparent = reading("voltage") * reading("current");
    let active = apparent * reading("pwr_factor");
    let reactive = (apparent * apparent - active * active).max(0.0).sqrt();

    doc.push(
        Group::Sensors,
        Record::new(format!("{label}_apparent_power"), round_to(apparent, 2)).with_unit("VA"),
    );
    doc.push(
        Group::Sensors,
        Record::new(format!("{label}_active_power"), round_to(active, 2)).with_unit("W"),
    );
    doc.push(
        Group::Sensors,
        Record::new(format!("{label}_reactive_power"), round_to(reactive, 2)).with_unit("VAr"),
    );
}

#[derive(Debug, Clone, Default)]
pub struct Ite11liDecoder;

impl UplinkDecoder for Ite11liDecoder {
    fn family(&self) -> Family {
        Family::Ite11li
    }

    fn ports(&self) -> &'static [u8] {
        &[ITE11LI_PORT]
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        let version = helpers::read_decoder_version(
            &mut cursor,
            "ite11li",
            &[DECODER_VERSION_1, DECODER_VERSION_2],
        )?;
        helpers::push_model(&mut doc, "ITE 11LI");

        let mut mask = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;
        schema::run(HEAD, &mut cursor, &mut mask, &mut doc)?;

        let phase_fields = if version == DECODER_VERSION_1 {
            PHASE_V1
        } else {
            PHASE_V2
        };

        let mut total_active = 0.0;
        let mut total_reactive = 0.0;
        for (index, label) in PHASES.iter().enumerate() {
            if !mask.bit(FIRST_PHASE_BIT + index as u8) {
                continue;
            }
            schema::run_block(
                phase_fields,
                label,
                Affix::Prefix,
                &mut cursor,
                &mut mask,
                &mut doc,
            )?;
            total_active += doc
                .number(Group::Sensors, &format!("{label}_active_energy"))
                .unwrap_or(0.0);
            total_reactive += doc
                .number(Group::Sensors, &format!("{label}_reactive_energy"))
                .unwrap_or(0.0);
            push_phase_power(&mut doc, label);
        }

        doc.push(
            Group::Sensors,
            Record::new("total_active_energy", round_to(total_active, 2)).with_unit("kWh"),
        );
        doc.push(
            Group::Sensors,
            Record::new("total_reactive_energy", round_to(total_reactive, 2)).with_unit("kVArh"),
        );

        schema::run(TAIL, &mut cursor, &mut mask, &mut doc)?;

        helpers::finish(&cursor, "ite11li");
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

    const PHASE_A: [u8; 14] = [
        0x09, 0x60, // 240.0 V
        0x13, 0x88, // 5000 raw current
        190,  // power factor 0.9
        0x00, 0x00, 0x03, 0xE8, // 10.00 kWh
        0x00, 0x00, 0x01, 0xF4, // 5.00 kVArh
        0x00, // POWCT-T16-150-333
    ];

    #[test]
    fn test_single_phase_v1() {
        let mut payload = vec![0x01, 0x00, 0x08];
        payload.extend_from_slice(&PHASE_A);
        let doc = Ite11liDecoder.decode(&Frame::new(&payload, 10)).unwrap();

        assert_eq!(doc.number(Group::Sensors, "phase_a_voltage"), Some(240.0));
        assert_eq!(doc.number(Group::Sensors, "phase_a_current"), Some(5.0));
        assert_eq!(doc.number(Group::Sensors, "phase_a_pwr_factor"), Some(0.9));
        assert_eq!(
            doc.find(Group::Sensors, "phase_a_tc_config").unwrap().value,
            Value::Label("POWCT-T16-150-333")
        );
        assert_eq!(doc.number(Group::Sensors, "phase_a_apparent_power"), Some(1200.0));
        assert_eq!(doc.number(Group::Sensors, "phase_a_active_power"), Some(1080.0));
        assert_eq!(doc.number(Group::Sensors, "phase_a_reactive_power"), Some(523.07));
        assert_eq!(doc.number(Group::Sensors, "total_active_energy"), Some(10.0));
        assert_eq!(doc.number(Group::Sensors, "total_reactive_energy"), Some(5.0));
        assert!(doc.find(Group::Sensors, "phase_b_voltage").is_none());
    }

    #[test]
    fn test_v2_current_scale() {
        let mut payload = vec![0x02, 0x00, 0x10];
        payload.extend_from_slice(&PHASE_A);
        let doc = Ite11liDecoder.decode(&Frame::new(&payload, 10)).unwrap();
        assert_eq!(doc.number(Group::Sensors, "phase_b_current"), Some(250.0));
    }

    #[test]
    fn test_header_and_dry_contact() {
        let payload = [
            0x01, 0x00, 0x47, // bits 0, 1, 2, 6
            0x01, 0x02, // firmware 0.1.0.2
            0x32, // 25.0 C
            0x96, // 60.0 Hz
            0x01, // CLOSED
        ];
        let doc = Ite11liDecoder.decode(&Frame::new(&payload, 10)).unwrap();
        assert_eq!(doc.number(Group::Sensors, "temperature"), Some(25.0));
        assert_eq!(doc.number(Group::Sensors, "frequency"), Some(60.0));
        assert_eq!(doc.number(Group::Sensors, "total_active_energy"), Some(0.0));
        assert_eq!(
            doc.find(Group::Sensors, "b1_state").unwrap().value,
            Value::Label("CLOSED")
        );
    }

    #[test]
    fn test_rejects_version_three() {
        assert_eq!(
            Ite11liDecoder
                .decode(&Frame::new(&[0x03, 0x00, 0x00], 10))
                .unwrap_err(),
            DecodeError::UnsupportedDecoderVersion {
                family: "ite11li",
                version: 3
            }
        );
    }
}

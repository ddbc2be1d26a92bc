//! NIT 21LV vibration sensor decoder
//!
//! Layout: `[reserved][mask:16]` followed by the fields the mask announces.
//! Vibration statistics come as x/y/z triplets behind a single mask bit.

use crate::constants::NIT21LV_PORT;
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group};
use crate::payload::schema::{self, Affix, Codec, Field, Presence, Repeat, Step};

const AXES: &[&str] = &["x", "y", "z"];

const RMS: &[(Presence, Field)] = &[(
    Presence::Always,
    Field::new(Group::Sensors, "rms", Codec::scaled(2, 10000.0, 4)).unit("ms2"),
)];
const KURTOSIS: &[(Presence, Field)] = &[(
    Presence::Always,
    Field::new(Group::Sensors, "kurtosis", Codec::scaled(2, 100.0, 2)).unit("factor"),
)];
const PEAK_TO_PEAK: &[(Presence, Field)] = &[(
    Presence::Always,
    Field::new(Group::Sensors, "peak_to_peak", Codec::scaled(2, 10000.0, 4)).unit("ms2"),
)];
const CREST_FACTOR: &[(Presence, Field)] = &[(
    Presence::Always,
    Field::new(Group::Sensors, "crest_factor", Codec::scaled(2, 100.0, 2)).unit("dB"),
)];
const VELOCITY: &[(Presence, Field)] = &[(
    Presence::Always,
    Field::new(Group::Sensors, "velocity", Codec::scaled(2, 100.0, 2)).unit("mms"),
)];

const fn triplet(fields: &'static [(Presence, Field)]) -> Step {
    Step::Repeat(Repeat {
        gate: Presence::NextBit,
        each: Presence::Always,
        labels: AXES,
        affix: Affix::Suffix,
        fields,
    })
}

const SCHEMA: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "battery", Codec::offset(1, 100.0, 1.0, 2)).unit("V"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "temperature", Codec::scaled(1, 2.0, 1)).unit("C"),
    ),
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Sensors, "humidity", Codec::scaled(1, 2.0, 1)).unit("%"),
    ),
    triplet(RMS),
    triplet(KURTOSIS),
    triplet(PEAK_TO_PEAK),
    triplet(CREST_FACTOR),
    triplet(VELOCITY),
];

#[derive(Debug, Clone, Default)]
pub struct Nit21lvDecoder;

impl UplinkDecoder for Nit21lvDecoder {
    fn family(&self) -> Family {
        Family::Nit21lv
    }

    fn ports(&self) -> &'static [u8] {
        &[NIT21LV_PORT]
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        // The first byte is a revision marker this layout does not vary on.
        cursor.skip(1)?;
        helpers::push_model(&mut doc, "NIT 21LV");

        let mut mask = MaskReader::read(&mut cursor, MaskWidth::Bits16)?;
        schema::run(SCHEMA, &mut cursor, &mut mask, &mut doc)?;

        helpers::finish(&cursor, "nit21lv");
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

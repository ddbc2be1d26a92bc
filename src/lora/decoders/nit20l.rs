//! NIT 20L temperature/humidity logger decoder
//!
//! Every frame starts with a codec version byte. Port 1 carries a batch of
//! logged samples `[timestamp:32][temperature:16][humidity:16]` until the end
//! of the payload. Ports 2..5 carry a regular report whose sensor fields
//! depend on the probe model the port announces:
//!
//! | port | probe   | temperature | humidity |
//! |------|---------|-------------|----------|
//! | 2    | none    |             |          |
//! | 3    | DS18B20 | yes         |          |
//! | 4    | THW100  | yes         | yes      |
//! | 5    | THW101  | yes         | yes      |
//!
//! A raw reading of `0xFFFF` means the channel was not sampled and produces
//! no record. Regular readings are stamped with the host receive time.

use crate::constants::{
    DECODER_VERSION_1, NIT20L_LOGGER_PORT, NIT20L_MAX_TIME_DRIFT, NIT20L_NOT_SAMPLED, NIT20L_PORTS,
};
use crate::error::DecodeError;
use crate::lora::decoder::{helpers, Family, Frame, UplinkDecoder};
use crate::payload::cursor::ByteCursor;
use crate::payload::data_encoding::{linear, twos_complement};
use crate::payload::mask::{MaskReader, MaskWidth};
use crate::payload::record::{Document, Group, Record};
use crate::payload::schema::{self, Codec, Field, Presence, Step};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    None,
    Ds18b20,
    Thw100,
    Thw101,
}

impl Probe {
    fn from_port(f_port: u8) -> Self {
        match f_port {
            3 => Probe::Ds18b20,
            4 => Probe::Thw100,
            5 => Probe::Thw101,
            _ => Probe::None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Probe::None => "none",
            Probe::Ds18b20 => "DS18B20",
            Probe::Thw100 => "THW100",
            Probe::Thw101 => "THW101",
        }
    }

    fn has_temperature(self) -> bool {
        self != Probe::None
    }

    fn has_humidity(self) -> bool {
        matches!(self, Probe::Thw100 | Probe::Thw101)
    }
}

const HEAD: &[Step] = &[
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "firmware_version", Codec::FirmwareBcd),
    ),
    Step::Flag {
        bit: Presence::NextBit,
        group: Group::Device,
        name: "power_source",
        on: "external",
        off: "battery",
    },
    Step::Field(
        Presence::NextBit,
        Field::new(Group::Device, "battery_voltage", Codec::scaled(2, 1000.0, 3)).unit("V"),
    ),
];

const SAMPLES: &[Step] = &[Step::FieldOr(
    Presence::NextBit,
    Field::new(Group::Sensors, "samples_stored", Codec::unsigned(2)),
    0.0,
)];

fn temperature(raw: u16) -> Option<f64> {
    (raw != NIT20L_NOT_SAMPLED).then(|| linear(twos_complement(raw as u64, 16) as f64, 10.0, 0.0, 1))
}

fn humidity(raw: u16) -> Option<f64> {
    (raw != NIT20L_NOT_SAMPLED).then(|| linear(raw as f64, 10.0, 0.0, 1))
}

fn sampled(name: &'static str, value: f64, unit: &'static str, time: Option<i64>) -> Record {
    let record = Record::new(name, value).with_unit(unit);
    match time {
        Some(time) => record.with_time(time),
        None => record,
    }
}

fn decode_logger(cursor: &mut ByteCursor<'_>, doc: &mut Document) -> Result<(), DecodeError> {
    while cursor.has_remaining() {
        let timestamp = cursor.read_u32()? as i64;
        if let Some(value) = temperature(cursor.read_u16()?) {
            doc.push(
                Group::Sensors,
                sampled("temperature", value, "°C", Some(timestamp)),
            );
        }
        if let Some(value) = humidity(cursor.read_u16()?) {
            doc.push(
                Group::Sensors,
                sampled("humidity", value, "RH %", Some(timestamp)),
            );
        }
    }
    Ok(())
}

fn decode_regular(
    probe: Probe,
    now: Option<i64>,
    cursor: &mut ByteCursor<'_>,
    doc: &mut Document,
) -> Result<(), DecodeError> {
    doc.push(Group::Sensors, Record::new("sensor_model", probe.name()));

    let mut mask = MaskReader::read(cursor, MaskWidth::Bits8)?;
    schema::run(HEAD, cursor, &mut mask, doc)?;

    if probe.has_temperature() {
        if let Some(value) = temperature(cursor.read_u16()?) {
            doc.push(Group::Sensors, sampled("temperature", value, "°C", now));
        }
    }
    if probe.has_humidity() {
        if let Some(value) = humidity(cursor.read_u16()?) {
            doc.push(Group::Sensors, sampled("humidity", value, "RH %", now));
        }
    }

    if mask.next_bit() {
        let control = cursor.read_u8()?;
        doc.push(
            Group::Sensors,
            Record::new(
                "c1_status",
                if control & 0x01 != 0 { "closed" } else { "open" },
            ),
        );
        if control & 0x02 != 0 {
            doc.push(Group::Sensors, Record::new("c1_counter", cursor.read_u24()?));
        }
    }

    schema::run(SAMPLES, cursor, &mut mask, doc)?;

    if mask.next_bit() {
        let device_time = cursor.read_u32()? as i64;
        match now {
            Some(now) if (device_time - now).abs() > NIT20L_MAX_TIME_DRIFT => doc.push(
                Group::Sensors,
                Record::new("time_drift", (device_time - now) as f64).with_unit("s"),
            ),
            Some(_) => {}
            None => debug!("nit20l: no receive time, clock drift not checked"),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Nit20lDecoder;

impl UplinkDecoder for Nit20lDecoder {
    fn family(&self) -> Family {
        Family::Nit20l
    }

    fn ports(&self) -> &'static [u8] {
        &NIT20L_PORTS
    }

    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let mut cursor = ByteCursor::new(frame.bytes);
        let mut doc = Document::new();

        helpers::read_decoder_version(&mut cursor, "nit20l", &[DECODER_VERSION_1])?;

        if frame.f_port == NIT20L_LOGGER_PORT {
            doc.push(Group::Device, Record::new("payload_type", "logger"));
            decode_logger(&mut cursor, &mut doc)?;
        } else {
            doc.push(Group::Device, Record::new("payload_type", "regular"));
            let now = frame
                .recv_time
                .map(|millis| (millis as f64 / 1000.0).round() as i64);
            decode_regular(Probe::from_port(frame.f_port), now, &mut cursor, &mut doc)?;
        }

        helpers::finish(&cursor, "nit20l");
        Ok(doc)
    }

    fn clone_box(&self) -> Box<dyn UplinkDecoder> {
        Box::new(self.clone())
    }
}

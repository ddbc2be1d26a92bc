//! LoRaWAN uplink decoder framework for Khomp devices
//!
//! Each device family implements [`UplinkDecoder`]. The [`DeviceManager`]
//! picks the family for a device, validates the fPort and turns the result
//! into the host-facing `{data}` / `{errors}` shape.

use crate::constants::FPORT_MAC_ONLY;
use crate::error::DecodeError;
use crate::lora::decoders::{
    Itc100Decoder, Itc200Decoder, Ite11liDecoder, Itp1xxDecoder, Itp200Decoder, Nit10laDecoder,
    Nit20lDecoder, Nit21lvDecoder, Nit2xliDecoder, Nit50clDecoder,
};
use crate::payload::record::Document;
use crate::util::hex::format_hex_compact;
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// One uplink as handed over by the network server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub bytes: &'a [u8],
    pub f_port: u8,
    /// Receive time in epoch milliseconds.
    pub recv_time: Option<i64>,
}

impl<'a> Frame<'a> {
    pub fn new(bytes: &'a [u8], f_port: u8) -> Self {
        Self {
            bytes,
            f_port,
            recv_time: None,
        }
    }

    pub fn with_recv_time(mut self, recv_time: i64) -> Self {
        self.recv_time = Some(recv_time);
        self
    }
}

/// Host input: `{ bytes, fPort, recvTime? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkInput {
    pub bytes: Vec<u8>,
    #[serde(rename = "fPort")]
    pub f_port: u8,
    #[serde(rename = "recvTime", default, skip_serializing_if = "Option::is_none")]
    pub recv_time: Option<i64>,
}

impl UplinkInput {
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            bytes: &self.bytes,
            f_port: self.f_port,
            recv_time: self.recv_time,
        }
    }
}

/// Host output: exactly one of `data` or `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UplinkOutput {
    Data { data: Document },
    Errors { errors: Vec<String> },
}

impl From<Result<Document, DecodeError>> for UplinkOutput {
    fn from(result: Result<Document, DecodeError>) -> Self {
        match result {
            Ok(data) => UplinkOutput::Data { data },
            Err(e) => UplinkOutput::Errors {
                errors: vec![e.to_string()],
            },
        }
    }
}

/// Host downlink output: `{ bytes }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownlinkOutput {
    pub bytes: Vec<u8>,
}

/// Trait for implementing uplink decoders
pub trait UplinkDecoder: Send + Sync + fmt::Debug {
    /// Device family handled by this decoder
    fn family(&self) -> Family;

    /// fPorts this family transmits on
    fn ports(&self) -> &'static [u8];

    /// Decode one frame; the port has already been validated
    fn decode(&self, frame: &Frame<'_>) -> Result<Document, DecodeError>;

    fn supports_port(&self, f_port: u8) -> bool {
        self.ports().contains(&f_port)
    }

    /// Encode a downlink configuration message
    fn encode_downlink(&self, _data: &serde_json::Value) -> Result<Vec<u8>, DecodeError> {
        Err(DecodeError::UnsupportedDownlink {
            family: self.family().name(),
        })
    }

    /// Clone the decoder into a boxed trait object
    fn clone_box(&self) -> Box<dyn UplinkDecoder>;
}

impl Clone for Box<dyn UplinkDecoder> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Khomp device families with a payload decoder.
///
/// Port numbers overlap between families, so a decoder is selected by family
/// first and the port is only validated against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Family {
    Itc100,
    Itc200,
    Ite11li,
    Itp1xx,
    Itp200,
    Nit10la,
    Nit20l,
    Nit21lv,
    Nit2xli,
    Nit50cl,
}

static FAMILY_NAMES: Lazy<HashMap<&'static str, Family>> = Lazy::new(|| {
    let mut names = HashMap::new();
    for family in Family::ALL {
        names.insert(family.name(), family);
    }
    names.insert("itc201", Family::Itc200);
    names.insert("itc204", Family::Itc200);
    names.insert("itc211", Family::Itc200);
    names.insert("itc214", Family::Itc200);
    names.insert("itp100", Family::Itp1xx);
    names.insert("itp111", Family::Itp1xx);
    names.insert("itp202", Family::Itp200);
    names.insert("nit20l-th-logger", Family::Nit20l);
    names.insert("nit20li", Family::Nit2xli);
    names.insert("nit21li", Family::Nit2xli);
    names
});

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Itc100,
        Family::Itc200,
        Family::Ite11li,
        Family::Itp1xx,
        Family::Itp200,
        Family::Nit10la,
        Family::Nit20l,
        Family::Nit21lv,
        Family::Nit2xli,
        Family::Nit50cl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::Itc100 => "itc100",
            Family::Itc200 => "itc200",
            Family::Ite11li => "ite11li",
            Family::Itp1xx => "itp1xx",
            Family::Itp200 => "itp200",
            Family::Nit10la => "nit10la",
            Family::Nit20l => "nit20l",
            Family::Nit21lv => "nit21lv",
            Family::Nit2xli => "nit2xli",
            Family::Nit50cl => "nit50cl",
        }
    }

    /// Look a family up by name or model alias, ignoring case, spaces and `_`.
    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        FAMILY_NAMES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| DecodeError::UnknownFamily(name.to_string()))
    }

    pub fn decoder(self) -> Box<dyn UplinkDecoder> {
        match self {
            Family::Itc100 => Box::new(Itc100Decoder),
            Family::Itc200 => Box::new(Itc200Decoder),
            Family::Ite11li => Box::new(Ite11liDecoder),
            Family::Itp1xx => Box::new(Itp1xxDecoder),
            Family::Itp200 => Box::new(Itp200Decoder),
            Family::Nit10la => Box::new(Nit10laDecoder),
            Family::Nit20l => Box::new(Nit20lDecoder),
            Family::Nit21lv => Box::new(Nit21lvDecoder),
            Family::Nit2xli => Box::new(Nit2xliDecoder),
            Family::Nit50cl => Box::new(Nit50clDecoder),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Family {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Family::from_name(&value)
    }
}

impl From<Family> for String {
    fn from(family: Family) -> Self {
        family.name().to_string()
    }
}

/// Validate the port and run one decoder over one frame.
pub fn decode_frame(decoder: &dyn UplinkDecoder, frame: &Frame<'_>) -> Result<Document, DecodeError> {
    if frame.f_port == FPORT_MAC_ONLY {
        debug!("{}: fPort 0 carries MAC commands only", decoder.family());
        return Ok(Document::new());
    }

    if !decoder.supports_port(frame.f_port) {
        return Err(DecodeError::UnsupportedPort {
            family: decoder.family().name(),
            port: frame.f_port,
        });
    }

    debug!(
        "{}: decoding fPort {} [{}]",
        decoder.family(),
        frame.f_port,
        format_hex_compact(frame.bytes)
    );

    let result = decoder.decode(frame);
    if let Err(e) = &result {
        warn!("{}: {}", decoder.family(), e);
    }
    result
}

/// Decode a host input for `family` into the host output shape.
pub fn decode_uplink(family: Family, input: &UplinkInput) -> UplinkOutput {
    let decoder = family.decoder();
    decode_frame(decoder.as_ref(), &input.frame()).into()
}

/// Encode a downlink for `family`.
pub fn encode_downlink(
    family: Family,
    data: &serde_json::Value,
) -> Result<DownlinkOutput, DecodeError> {
    let bytes = family.decoder().encode_downlink(data)?;
    Ok(DownlinkOutput { bytes })
}

/// Device registry file: `{ "default": "nit2xli", "devices": { "<DevEUI>": "itc200" } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub default: Option<Family>,
    #[serde(default)]
    pub devices: HashMap<String, Family>,
}

/// Device manager mapping device identifiers to decoder families
#[derive(Debug, Clone, Default)]
pub struct DeviceManager {
    decoders: HashMap<String, Box<dyn UplinkDecoder>>,
    default_decoder: Option<Box<dyn UplinkDecoder>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: RegistryConfig) -> Self {
        let mut manager = Self::new();
        if let Some(family) = config.default {
            manager.set_default_family(family);
        }
        for (device, family) in config.devices {
            manager.register_device(device, family);
        }
        manager
    }

    /// Build from a registry JSON document.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let config: RegistryConfig =
            serde_json::from_str(json).map_err(|e| DecodeError::InvalidInput(e.to_string()))?;
        Ok(Self::from_config(config))
    }

    /// Build from a registry JSON file.
    pub fn load_registry(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DecodeError::InvalidInput(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Device identifiers are matched case-insensitively.
    pub fn register_device(&mut self, device: impl Into<String>, family: Family) {
        self.decoders
            .insert(device.into().to_ascii_lowercase(), family.decoder());
    }

    pub fn set_default_family(&mut self, family: Family) {
        self.default_decoder = Some(family.decoder());
    }

    pub fn family_of(&self, device: &str) -> Option<Family> {
        self.decoders
            .get(&device.to_ascii_lowercase())
            .or(self.default_decoder.as_ref())
            .map(|d| d.family())
    }

    pub fn device_count(&self) -> usize {
        self.decoders.len()
    }

    /// Decode a frame from a specific device
    pub fn decode_payload(&self, device: &str, frame: &Frame<'_>) -> Result<Document, DecodeError> {
        let decoder = self
            .decoders
            .get(&device.to_ascii_lowercase())
            .or(self.default_decoder.as_ref())
            .ok_or_else(|| DecodeError::UnknownFamily(device.to_string()))?;
        decode_frame(decoder.as_ref(), frame)
    }

    pub fn decode_uplink(&self, device: &str, input: &UplinkInput) -> UplinkOutput {
        self.decode_payload(device, &input.frame()).into()
    }
}

/// Helper functions shared by the family decoders
pub mod helpers {
    use crate::error::DecodeError;
    use crate::payload::cursor::ByteCursor;
    use crate::payload::record::{Document, Group, Record};
    use log::debug;

    /// Read the leading decoder version byte and check it against `supported`.
    pub fn read_decoder_version(
        cursor: &mut ByteCursor<'_>,
        family: &'static str,
        supported: &[u8],
    ) -> Result<u8, DecodeError> {
        let version = cursor.read_u8()?;
        if !supported.contains(&version) {
            return Err(DecodeError::UnsupportedDecoderVersion { family, version });
        }
        Ok(version)
    }

    /// Append the `model` record to the device group.
    pub fn push_model(doc: &mut Document, model: &'static str) {
        doc.push(Group::Device, Record::new("model", model));
    }

    /// Log bytes no schema step consumed.
    pub fn finish(cursor: &ByteCursor<'_>, family: &'static str) {
        if cursor.has_remaining() {
            debug!(
                "{family}: {} trailing byte(s) after offset {}",
                cursor.remaining(),
                cursor.position()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_lookup_aliases() {
        assert_eq!(Family::from_name("ITC 204").unwrap(), Family::Itc200);
        assert_eq!(Family::from_name("nit_21li").unwrap(), Family::Nit2xli);
        assert_eq!(Family::from_name("NIT21LV").unwrap(), Family::Nit21lv);
        assert_eq!(
            Family::from_name("xyz").unwrap_err(),
            DecodeError::UnknownFamily("xyz".to_string())
        );
    }

    #[test]
    fn test_every_family_round_trips_its_name() {
        for family in Family::ALL {
            assert_eq!(Family::from_name(family.name()).unwrap(), family);
            assert_eq!(family.decoder().family(), family);
        }
    }

    #[test]
    fn test_port_zero_is_empty_document() {
        let decoder = Family::Nit50cl.decoder();
        let doc = decode_frame(decoder.as_ref(), &Frame::new(&[0xAA], 0)).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_unsupported_port() {
        let decoder = Family::Nit21lv.decoder();
        let err = decode_frame(decoder.as_ref(), &Frame::new(&[0x01], 99)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedPort {
                family: "nit21lv",
                port: 99
            }
        );
    }

    #[test]
    fn test_output_is_data_or_errors() {
        let ok: UplinkOutput = Ok(Document::new()).into();
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"data":{}}"#);

        let err: UplinkOutput = Err(DecodeError::UnknownFamily("x".into())).into();
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"errors":["Unknown device family: x"]}"#
        );
    }

    #[test]
    fn test_input_field_names() {
        let input: UplinkInput =
            serde_json::from_str(r#"{"bytes":[1,0,1],"fPort":20,"recvTime":1700000000000}"#)
                .unwrap();
        assert_eq!(input.f_port, 20);
        assert_eq!(input.recv_time, Some(1_700_000_000_000));

        let input: UplinkInput = serde_json::from_str(r#"{"bytes":[],"fPort":3}"#).unwrap();
        assert_eq!(input.recv_time, None);
    }

    #[test]
    fn test_registry_from_json() {
        let manager = DeviceManager::from_json(
            r#"{"default":"nit2xli","devices":{"70B3D5E75E000001":"ITC 201"}}"#,
        )
        .unwrap();
        assert_eq!(manager.device_count(), 1);
        assert_eq!(
            manager.family_of("70b3d5e75e000001"),
            Some(Family::Itc200)
        );
        assert_eq!(manager.family_of("unknown"), Some(Family::Nit2xli));
    }

    #[test]
    fn test_registry_rejects_unknown_family() {
        assert!(matches!(
            DeviceManager::from_json(r#"{"devices":{"a":"nope"}}"#),
            Err(DecodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unregistered_device_without_default() {
        let manager = DeviceManager::new();
        assert!(matches!(
            manager.decode_payload("dev", &Frame::new(&[], 3)),
            Err(DecodeError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_downlink_is_unsupported() {
        let err = encode_downlink(Family::Nit2xli, &serde_json::json!({})).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedDownlink { family: "nit2xli" });
    }
}

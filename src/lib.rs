//! # khomp-lora - Uplink Payload Decoders for Khomp LoRaWAN Devices
//!
//! The khomp-lora crate turns raw LoRaWAN uplink payloads from Khomp
//! metering, lighting and environmental devices into named, unit-tagged
//! measurement records.
//!
//! ## Features
//!
//! - Bounded byte cursor that reports truncation instead of reading past the payload
//! - Presence masks driving which fields follow, LSB first
//! - Declarative field schemas shared by every device family
//! - Ten device families, including the NIT 2xLI extension module chain
//! - Host-facing `{data}` / `{errors}` output and a JSON device registry
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! khomp-lora = "0.1.0"
//! ```
//!
//! ```rust
//! use khomp_lora::{decode_frame, Family, Frame, Group};
//!
//! let decoder = Family::Nit21lv.decoder();
//! let doc = decode_frame(decoder.as_ref(), &Frame::new(&[0x01, 0x00, 0x00, 0x00], 13)).unwrap();
//! assert!(doc.find(Group::Device, "model").is_some());
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod lora;
pub mod payload;
pub mod util;

pub use crate::error::DecodeError;
pub use crate::logging::{init_logger, init_logger_with_default, log_info};

// Decoder framework
pub use lora::{
    decode_frame, decode_uplink, encode_downlink, DeviceManager, DownlinkOutput, Family, Frame,
    RegistryConfig, UplinkDecoder, UplinkInput, UplinkOutput,
};

// Decoding engine
pub use payload::{
    Affix, ByteCursor, Codec, Document, Endian, Field, Group, MaskReader, MaskWidth, Presence,
    Record, Repeat, Stats, Step, Value,
};

/// Decode `bytes` received on `f_port` as a device of the named family.
///
/// # Arguments
/// * `family` - Family name or model alias, e.g. `"nit2xli"` or `"ITC 201"`
/// * `bytes` - Raw uplink payload
/// * `f_port` - LoRaWAN fPort the uplink arrived on
///
/// # Returns
/// * `Result<Document, DecodeError>` - The grouped records, or the first structural error
pub fn decode(family: &str, bytes: &[u8], f_port: u8) -> Result<Document, DecodeError> {
    let family = Family::from_name(family)?;
    decode_frame(family.decoder().as_ref(), &Frame::new(bytes, f_port))
}

//! # Decode Error Handling
//!
//! This module defines the DecodeError enum, which represents the structural
//! failures a payload decode can end with.

use thiserror::Error;

/// Represents the different error types that can occur while decoding an uplink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The fPort is outside the ports declared by the selected device family.
    #[error("Unsupported fPort {port} for {family}")]
    UnsupportedPort { family: &'static str, port: u8 },

    /// The in-payload decoder version byte is not one the family understands.
    #[error("Unsupported decoder version {version} for {family}")]
    UnsupportedDecoderVersion { family: &'static str, version: u8 },

    /// A read would have advanced the cursor past the end of the payload.
    #[error("Truncated payload: need {needed} byte(s) at offset {offset}, {available} available")]
    TruncatedPayload {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A raw value fell outside the domain of a lookup table.
    #[error("Unknown value {value} for {table}")]
    UnknownEnumValue { table: &'static str, value: u32 },

    /// An extension module type byte with no known schema.
    ///
    /// The extension chain recovers from this locally; it only escapes when a
    /// caller decodes a single module directly.
    #[error("Unrecognized extension module type 0x{0:02X}")]
    UnrecognizedExtensionModule(u8),

    /// No decoder family is registered under this name or device.
    #[error("Unknown device family: {0}")]
    UnknownFamily(String),

    /// The family has no downlink encoder.
    #[error("Downlink encoding is not supported for {family}")]
    UnsupportedDownlink { family: &'static str },

    /// Host input that could not be turned into a frame.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DecodeError {
    /// Errors the host should never retry: the same frame fails the same way.
    pub fn is_structural(&self) -> bool {
        !matches!(self, DecodeError::UnrecognizedExtensionModule(_))
    }
}

//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers for rendering ROM identifiers, logging raw uplinks and reading
//! payloads typed on the command line.
//!
//! ```rust
//! use khomp_lora::util::hex::{decode_hex, encode_hex_upper, format_hex_compact};
//!
//! let payload = decode_hex("01 00 01").unwrap();
//! assert_eq!(payload, vec![0x01, 0x00, 0x01]);
//! assert_eq!(encode_hex_upper(&payload), "010001");
//! assert_eq!(format_hex_compact(&payload), "01 00 01");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes to uppercase hex string, two digits per byte
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters, an optional `0x`
/// prefix, and whitespace between bytes.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "01 00 01" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Helper for creating test data from hex strings
///
/// Panics on invalid hex (intended for test code only).
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    decode_hex(hex).expect("Invalid hex in test data")
}

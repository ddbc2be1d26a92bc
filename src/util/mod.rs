//! # Utility Modules
//!
//! Small helpers shared by the decoders and the CLI.

pub mod hex;

pub use hex::{decode_hex, encode_hex, encode_hex_upper, format_hex_compact, hex_to_bytes};

//! The payload module contains the generic decoding engine shared by every
//! device family: the byte cursor, presence masks, numeric codecs, field
//! schemas and the grouped output document.

pub mod cursor;
pub mod data_encoding;
pub mod mask;
pub mod record;
pub mod schema;

pub use cursor::{ByteCursor, Endian};
pub use data_encoding::*;
pub use mask::{MaskReader, MaskWidth};
pub use record::{Document, Group, Record, Stats, Value};
pub use schema::{Affix, Codec, Field, Presence, Repeat, Step};

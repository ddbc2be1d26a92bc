//! Decoder implementations for each Khomp device family

// Node decoders
pub mod itc100;
pub mod itc200;
pub mod ite11li;
pub mod itp1xx;
pub mod itp200;
pub mod nit10la;
pub mod nit20l;
pub mod nit21lv;
pub mod nit2xli;
pub mod nit50cl;

// Extension modules chained after NIT 2xLI node fields
pub mod extension;

pub use itc100::Itc100Decoder;
pub use itc200::Itc200Decoder;
pub use ite11li::Ite11liDecoder;
pub use itp1xx::Itp1xxDecoder;
pub use itp200::Itp200Decoder;
pub use nit10la::Nit10laDecoder;
pub use nit20l::Nit20lDecoder;
pub use nit21lv::Nit21lvDecoder;
pub use nit2xli::Nit2xliDecoder;
pub use nit50cl::Nit50clDecoder;

pub use extension::ModuleKind;

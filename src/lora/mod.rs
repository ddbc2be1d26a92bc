//! LoRaWAN uplink decoding for Khomp devices
//!
//! [`decoder`] holds the family-independent framework (frames, the
//! [`UplinkDecoder`] trait, family lookup and the device registry);
//! [`decoders`] holds one module per device family.

pub mod decoder;
pub mod decoders;

pub use decoder::{
    decode_frame, decode_uplink, encode_downlink, DeviceManager, DownlinkOutput, Family, Frame,
    RegistryConfig, UplinkDecoder, UplinkInput, UplinkOutput,
};
pub use decoders::{
    Itc100Decoder, Itc200Decoder, Ite11liDecoder, Itp1xxDecoder, Itp200Decoder, ModuleKind,
    Nit10laDecoder, Nit20lDecoder, Nit21lvDecoder, Nit2xliDecoder, Nit50clDecoder,
};

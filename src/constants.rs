//! Khomp Payload Constants
//!
//! fPorts, decoder versions and physical constants shared by the device
//! family decoders.

/// Offset between Kelvin and degrees Celsius
pub const KELVIN_OFFSET: f64 = -273.15;

/// LoRaWAN fPort reserved for MAC commands
pub const FPORT_MAC_ONLY: u8 = 0;

/// ITC 100 water meter counter
pub const ITC100_PORT: u8 = 9;

/// ITC 201/204/211/214 pulse counters
pub const ITC200_PORTS: [u8; 4] = [16, 17, 18, 19];

/// ITE 11LI three-phase power meter
pub const ITE11LI_PORT: u8 = 10;

/// ITP 100 / ITP 111 lighting controllers
pub const ITP1XX_PORTS: [u8; 2] = [5, 8];

/// ITP 200 / ITP 202 lighting controllers
pub const ITP200_PORTS: [u8; 2] = [14, 15];

/// NIT 10LA air quality node
pub const NIT10LA_PORT: u8 = 21;

/// NIT 20L logger, regular and batch report ports
pub const NIT20L_PORTS: [u8; 5] = [1, 2, 3, 4, 5];

/// NIT 20L batch logger port
pub const NIT20L_LOGGER_PORT: u8 = 1;

/// NIT 21LV vibration sensor
pub const NIT21LV_PORT: u8 = 13;

/// NIT 2xLI configuration echo port
pub const NIT2XLI_CONFIG_PORT: u8 = 1;

/// NIT 20LI / NIT 21LI uplink ports
pub const NIT2XLI_PORTS: [u8; 3] = [1, 3, 4];

/// NIT 50CL counter node
pub const NIT50CL_PORT: u8 = 20;

/// Decoder version carried by every versioned family's first byte
pub const DECODER_VERSION_1: u8 = 1;

/// ITE 11LI firmware revision with 20-scale current
pub const DECODER_VERSION_2: u8 = 2;

/// ITP 1xx status report header
pub const ITP1XX_REPORT_HEADER: [u8; 2] = [0x4C, 0x01];

/// ITP 1xx alarm frame leading byte
pub const ITP1XX_ALARM_HEADER: u8 = 0x4B;

/// Largest clock drift accepted from a NIT 20L before it is reported (seconds)
pub const NIT20L_MAX_TIME_DRIFT: i64 = 60;

/// Sentinel raw value marking a NIT 20L channel as not sampled
pub const NIT20L_NOT_SAMPLED: u16 = 0xFFFF;

/// Width of a 1-Wire ROM identifier in bytes
pub const ROM_ID_LEN: usize = 8;

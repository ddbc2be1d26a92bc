use khomp_lora::payload::data_encoding::*;
use khomp_lora::payload::{ByteCursor, Codec, EnumTable, Endian, MaskReader, MaskWidth, Value};
use khomp_lora::DecodeError;
use proptest::prelude::*;

#[test]
fn test_linear_rounding() {
    assert_eq!(linear(2400.0, 10.0, 0.0, 1), 240.0);
    assert_eq!(linear(190.0, 100.0, -1.0, 2), 0.9);
    assert_eq!(linear(15.0, 10.0, 45.0, 1), 46.5);
    assert_eq!(round_to(1.005_1, 2), 1.01);
}

#[test]
fn test_kelvin() {
    assert_eq!(kelvin_to_celsius(29815.0, 100.0, 2), 25.0);
    assert_eq!(kelvin_to_celsius(2731.5, 10.0, 2), 0.0);
}

#[test]
fn test_twos_complement_edges() {
    assert_eq!(twos_complement(0xFF9C, 16), -100);
    assert_eq!(twos_complement(0x7FFF, 16), 32767);
    assert_eq!(twos_complement(0x8000, 16), -32768);
    assert_eq!(twos_complement(0x80, 8), -128);
}

#[test]
fn test_firmware_layouts() {
    assert_eq!(bcd_firmware(0x12, 0x34), "1.2.3.4");
    assert_eq!(bcd_firmware_swapped(0x21, 0x43), "3.4.1.2");
    assert_eq!(packed_firmware(1_036_309), "1.3.63.9");
    assert_eq!(decimal_firmware(1234), "1.2.3.4");
}

#[test]
fn test_lat_lon() {
    assert_eq!(signed_lat_lon(0x8000_0001), -0.000001);
    assert_eq!(signed_lat_lon(50_000_000), 50.0);
    assert_eq!(signed_lat_lon(0x8000_0000), 0.0);
}

#[test]
fn test_enum_table_offsets() {
    const MODES: EnumTable = EnumTable::starting_at("mode", 0x49, &["a", "b"]);
    assert_eq!(MODES.lookup(0x4A).unwrap(), "b");
    assert_eq!(
        MODES.lookup(0x48).unwrap_err(),
        DecodeError::UnknownEnumValue {
            table: "mode",
            value: 0x48
        }
    );
    assert!(enum_lookup(0x4B, &MODES).is_err());
}

#[test]
fn test_codec_reads_little_endian() {
    let data = [0x77, 0x74, 0x58, 0x02];
    let mut cursor = ByteCursor::new(&data);
    assert_eq!(
        Codec::kelvin(2, 100.0, 2).le().decode(&mut cursor).unwrap(),
        Value::Number(25.0)
    );
    assert_eq!(
        Codec::scaled(2, 10.0, 1).le().decode(&mut cursor).unwrap(),
        Value::Number(60.0)
    );
    assert!(!cursor.has_remaining());
}

#[test]
fn test_mask_field_extraction() {
    let mask = MaskReader::new(0b1011_0110, MaskWidth::Bits8);
    assert_eq!(mask.field(1, 2), 0b11);
    assert_eq!(mask.field(4, 3), 0b011);
    assert_eq!(mask.field(8, 4), 0);
    assert!(!mask.bit(9));
}

proptest! {
    #[test]
    fn prop_linear_is_monotonic(
        a in 0u32..=0xFF_FFFF,
        b in 0u32..=0xFF_FFFF,
        scale in prop::sample::select(vec![1.0, 2.0, 10.0, 100.0, 1000.0]),
        offset in -300.0f64..300.0,
        decimals in 0u8..=3,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            linear(lo as f64, scale, offset, decimals) <= linear(hi as f64, scale, offset, decimals)
        );
    }

    #[test]
    fn prop_rounding_is_idempotent(x in -1.0e6f64..1.0e6, decimals in 0u8..=6) {
        let once = round_to(x, decimals);
        prop_assert_eq!(round_to(once, decimals), once);
    }

    #[test]
    fn prop_twos_complement_matches_i16(raw in any::<u16>()) {
        prop_assert_eq!(twos_complement(raw as u64, 16), raw as i16 as i64);
    }

    #[test]
    fn prop_lat_lon_sign(magnitude in 0u32..0x8000_0000) {
        let positive = signed_lat_lon(magnitude);
        let negative = signed_lat_lon(magnitude | 0x8000_0000);
        prop_assert!(positive >= 0.0);
        prop_assert_eq!(negative, -positive);
    }

    #[test]
    fn prop_rom_is_reversed_hex(rom in any::<[u8; 8]>()) {
        let mut cursor = ByteCursor::new(&rom);
        let rendered = cursor.read_rom_reversed().unwrap();

        let mut reversed = rom;
        reversed.reverse();
        let expected: String = reversed.iter().map(|b| format!("{:02X}", b)).collect();
        prop_assert_eq!(rendered, expected);
        prop_assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn prop_endianness_mirrors(bytes in prop::collection::vec(any::<u8>(), 1..=8)) {
        let big = ByteCursor::new(&bytes).read_uint(bytes.len(), Endian::Big).unwrap();
        let mut reversed = bytes.clone();
        reversed.reverse();
        let little = ByteCursor::new(&reversed)
            .read_uint(bytes.len(), Endian::Little)
            .unwrap();
        prop_assert_eq!(big, little);
    }

    #[test]
    fn prop_short_reads_never_advance(len in 0usize..4, want in 1usize..=8) {
        let data = vec![0xAAu8; len];
        let mut cursor = ByteCursor::new(&data);
        if want > len {
            prop_assert!(
                matches!(
                    cursor.read_uint(want, Endian::Big),
                    Err(DecodeError::TruncatedPayload { offset: 0, .. })
                ),
                "short read must report truncation"
            );
            prop_assert_eq!(cursor.position(), 0);
        }
    }

    #[test]
    fn prop_next_bit_matches_bit(value in any::<u16>()) {
        let mut mask = MaskReader::new(value as u32, MaskWidth::Bits16);
        for k in 0..20u8 {
            let expected = mask.bit(k);
            prop_assert_eq!(mask.next_bit(), expected);
        }
    }
}

//! End-to-end frames through the public decode entry points.

use khomp_lora::payload::data_encoding::{bcd_firmware, signed_lat_lon};
use khomp_lora::{decode, decode_frame, DecodeError, Family, Frame, Group, Value};
use proptest::prelude::*;

/// ITE 11LI v1 report with phase A only.
const ITE11LI_PHASE_A: [u8; 17] = [
    0x01, 0x00, 0x08, // version, phase A
    0x09, 0x60, // 2400 raw voltage
    0x13, 0x88, // current
    190,  // power factor
    0x00, 0x00, 0x03, 0xE8, // active energy
    0x00, 0x00, 0x01, 0xF4, // reactive energy
    0x00, // CT model
];

/// NIT 50CL report where every announced byte is mandatory.
const NIT50CL_REPORT: [u8; 16] = [
    0x01, 0x06, 0x4C, 0x00, 0x23, 0x64, 0x07, 0x01, 0x00, 0x3C, 0x00, 0x00, 0x2A, 0x00, 0x0E,
    0x10,
];

fn modules(doc: &khomp_lora::Document) -> Vec<&str> {
    doc.group(Group::Modules)
        .map(|records| records.iter().map(|r| r.name.as_str()).collect())
        .unwrap_or_default()
}

#[test]
fn test_firmware_bit_without_bytes_is_truncated() {
    let err = decode("nit50cl", &[0x01, 0x00, 0x01], 20).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedPayload { .. }));
}

#[test]
fn test_phase_voltage_scale() {
    let doc = decode("ite11li", &ITE11LI_PHASE_A, 10).unwrap();
    assert_eq!(doc.number(Group::Sensors, "phase_a_voltage"), Some(240.0));
    assert_eq!(
        doc.find(Group::Sensors, "phase_a_voltage").unwrap().unit,
        Some("V")
    );
}

#[test]
fn test_nibble_bcd_firmware() {
    assert_eq!(bcd_firmware(0x12, 0x34), "1.2.3.4");

    let doc = decode("nit10la", &[0x01, 0x00, 0x01, 0x12, 0x34], 21).unwrap();
    assert_eq!(
        doc.find(Group::Device, "firmware_version").unwrap().value,
        Value::Text("1.2.3.4".to_string())
    );
}

#[test]
fn test_unknown_module_keeps_earlier_modules() {
    let payload = [
        0x00, 0x00, // no node fields
        0x05, 0x01, 0x01, 0x2A, 0x00, // R102 contact C3 closed, 42 pulses
        0x02, 0x01, 0x10, 0x27, // C104 channel 1, 10.00 mA
        0xFF, 0x01, 0x02, // unknown module and whatever follows it
    ];
    let doc = decode("NIT 20LI", &payload, 3).unwrap();

    assert_eq!(
        modules(&doc),
        vec!["emr_c3_status", "emr_c3_count", "emc_e1_curr"]
    );
    assert_eq!(doc.number(Group::Modules, "emr_c3_count"), Some(42.0));
    assert_eq!(doc.number(Group::Modules, "emc_e1_curr"), Some(10.0));
}

#[test]
fn test_sign_magnitude_latitude() {
    assert_eq!(signed_lat_lon(0x8000_0001), -0.000001);

    let payload = [
        0x4C, 0x01, 0x21, 0x43, // report, firmware
        0x00, 0x00, 0x08, 0x00, // coordinates only
        0x80, 0x00, 0x00, 0x01, // latitude
        0x00, 0x00, 0x00, 0x00, // longitude
    ];
    let doc = decode("itp100", &payload, 5).unwrap();
    assert_eq!(doc.number(Group::Sensors, "latitude"), Some(-0.000001));
}

#[test]
fn test_fport_zero_on_any_family() {
    for family in Family::ALL {
        let doc = decode_frame(family.decoder().as_ref(), &Frame::new(&[0xDE, 0xAD], 0)).unwrap();
        assert!(doc.is_empty(), "{family}");
    }
}

#[test]
fn test_port_is_validated_per_family() {
    // Port 9 belongs to the ITC 100 only.
    assert!(decode("itc100", &[], 9).is_err());
    assert_eq!(
        decode("nit2xli", &[0x00, 0x00], 9).unwrap_err(),
        DecodeError::UnsupportedPort {
            family: "nit2xli",
            port: 9
        }
    );
}

proptest! {
    #[test]
    fn prop_strict_prefix_is_truncated(cut in 0usize..ITE11LI_PHASE_A.len()) {
        let result = decode("ite11li", &ITE11LI_PHASE_A[..cut], 10);
        prop_assert!(
            matches!(result, Err(DecodeError::TruncatedPayload { .. })),
            "cut {}: {:?}",
            cut,
            result
        );
    }

    #[test]
    fn prop_nit50cl_prefix_is_truncated(cut in 0usize..NIT50CL_REPORT.len()) {
        let result = decode("nit50cl", &NIT50CL_REPORT[..cut], 20);
        prop_assert!(
            matches!(result, Err(DecodeError::TruncatedPayload { .. })),
            "cut {}: {:?}",
            cut,
            result
        );
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        recv_time in prop::option::of(0i64..4_000_000_000_000),
    ) {
        for family in Family::ALL {
            let decoder = family.decoder();
            for &port in decoder.ports() {
                let mut frame = Frame::new(&bytes, port);
                if let Some(recv_time) = recv_time {
                    frame = frame.with_recv_time(recv_time);
                }
                let result = decode_frame(decoder.as_ref(), &frame);
                if let Err(e) = result {
                    prop_assert!(
                        !matches!(e, DecodeError::UnsupportedPort { .. }),
                        "{} port {}: {}",
                        family,
                        port,
                        e
                    );
                }
            }
        }
    }

    #[test]
    fn prop_unannounced_fields_are_absent(mask in 0u16..0x40) {
        let mut payload = vec![0x01, (mask >> 8) as u8, mask as u8];
        payload.extend_from_slice(&[0u8; 16]);
        let doc = decode("nit10la", &payload, 21).unwrap();

        let sensors = doc.group(Group::Sensors).map_or(0, |r| r.len());
        prop_assert_eq!(sensors as u32, (mask >> 1 & 0x1F).count_ones());
        prop_assert_eq!(
            doc.find(Group::Device, "firmware_version").is_some(),
            mask & 0x01 != 0
        );
    }
}

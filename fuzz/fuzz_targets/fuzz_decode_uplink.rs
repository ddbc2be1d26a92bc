#![no_main]

use khomp_lora::{decode_frame, Family, Frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the fPort; the rest is the payload.
    let (f_port, payload) = (data[0], &data[1..]);
    for family in Family::ALL {
        let decoder = family.decoder();
        let _ = decode_frame(decoder.as_ref(), &Frame::new(payload, f_port));
        for &port in decoder.ports() {
            let _ = decode_frame(
                decoder.as_ref(),
                &Frame::new(payload, port).with_recv_time(1_700_000_000_000),
            );
        }
    }
});

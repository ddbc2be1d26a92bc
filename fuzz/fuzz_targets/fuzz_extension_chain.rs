#![no_main]

use khomp_lora::lora::decoders::extension::decode_chain;
use khomp_lora::{ByteCursor, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);
    let mut doc = Document::new();
    let _ = decode_chain(&mut cursor, &mut doc);
});

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder
    let _ = zenrle::decode(data, enough::Unstoppable);

    // Nor with tight limits in place
    let limits = zenrle::Limits {
        max_pixels: Some(1 << 16),
        max_memory_bytes: Some(1 << 20),
        ..Default::default()
    };
    let _ = zenrle::decode_with_limits(data, &limits, enough::Unstoppable);
});

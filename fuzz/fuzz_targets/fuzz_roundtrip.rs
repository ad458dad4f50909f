#![no_main]
use libfuzzer_sys::fuzz_target;
use zenrle::*;

fuzz_target!(|data: &[u8]| {
    // If it decodes, re-encoding every pixel and decoding again must
    // reproduce the buffer exactly, whatever the input stream looked like.
    let Ok(decoded) = decode(data, enough::Unstoppable) else {
        return;
    };

    let reencoded = encode(&decoded, BackgroundMode::SaveAll, enough::Unstoppable)
        .expect("decoded image must re-encode");
    let decoded2 = decode(&reencoded, enough::Unstoppable).expect("re-encoded data must decode");

    assert_eq!(decoded.pixels, decoded2.pixels, "roundtrip pixel mismatch");
    assert_eq!(decoded.header.xlen, decoded2.header.xlen);
    assert_eq!(decoded.header.ylen, decoded2.header.ylen);
    assert_eq!(decoded.header.endian, decoded2.header.endian);
});

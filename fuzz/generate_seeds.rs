#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // 1x1 RGB, no background, one literal per channel
    let mut tiny = le_head(1, 1, 3, 0x02, &[]);
    for (c, v) in [(0u8, 0xCCu8), (1, 0x99), (2, 0x66)] {
        tiny.extend_from_slice(&[0x01, c, 0x03, 0x00, v, 0x00]);
    }
    tiny.push(0x06);
    fs::write(format!("{dir}/rgb_1x1.rle"), tiny).unwrap();

    // 4x4 gray with runs and a line skip
    let mut gray = le_head(4, 4, 1, 0x02, &[]);
    gray.extend_from_slice(&[0x01, 0x00, 0x05, 0x03, 0x80, 0x00]);
    gray.extend_from_slice(&[0x00, 0x01]); // skip a line
    gray.extend_from_slice(&[0x01, 0x00, 0x05, 0x03, 0x40, 0x00]);
    gray.push(0x06);
    fs::write(format!("{dir}/gray_4x4.rle"), gray).unwrap();

    // 8x2 RGB with background block and pixel skips
    let mut bg = le_head(8, 2, 3, 0x00, &[10, 20, 30]);
    bg.extend_from_slice(&[0x01, 0x00, 0x02, 0x03, 0x03, 0x01, 0x55, 0xAA]);
    bg.push(0x06);
    fs::write(format!("{dir}/bg_8x2.rle"), bg).unwrap();

    // 2x1 RGBA addressing the alpha plane as channel 255
    let mut alpha = le_head(2, 1, 3, 0x02 | 0x04, &[]);
    alpha.extend_from_slice(&[0x01, 0xFF, 0x05, 0x01, 0x4D, 0x00]);
    alpha.push(0x06);
    fs::write(format!("{dir}/alpha_2x1.rle"), alpha).unwrap();

    // Big-endian stamp with a long-form run
    let mut be = vec![0xCC, 0x52, 0, 0, 0, 0, 0, 3, 0, 1, 0x02, 1, 8, 0, 0, 0];
    be.extend_from_slice(&[0x01, 0x00, 0x45, 0x00, 0x02, 0x00, 0x07, 0x06]);
    fs::write(format!("{dir}/be_3x1.rle"), be).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_magic.bin"), [0x52u8, 0xCC]).unwrap();
    fs::write(format!("{dir}/bad_magic.bin"), [0xFFu8, 0xFF, 0, 0]).unwrap();

    println!("Generated seed corpus in {dir}/");
}

fn le_head(w: u16, h: u16, ncolors: u8, flags: u8, background: &[u8]) -> Vec<u8> {
    let mut v = vec![0x52, 0xCC, 0, 0, 0, 0];
    v.extend_from_slice(&w.to_le_bytes());
    v.extend_from_slice(&h.to_le_bytes());
    v.extend_from_slice(&[flags, ncolors, 8, 0, 0]);
    if flags & 0x02 != 0 {
        v.push(0);
    } else {
        v.extend_from_slice(background);
        if ncolors % 2 == 0 {
            v.push(0);
        }
    }
    v
}

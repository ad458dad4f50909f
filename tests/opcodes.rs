//! Byte-level conformance: header layout, opcode encodings, the scanline
//! delimiter state machine, bounds clamping, and malformed-stream errors.

use enough::Unstoppable;
use zenrle::*;

/// Little-endian fixed head with NO_BACKGROUND and its pad byte.
fn no_bg_head(w: u16, h: u16, ncolors: u8, extra_flags: u8) -> Vec<u8> {
    let mut v = vec![0x52, 0xCC, 0, 0, 0, 0];
    v.extend_from_slice(&w.to_le_bytes());
    v.extend_from_slice(&h.to_le_bytes());
    v.push(FLAG_NO_BACKGROUND | extra_flags);
    v.push(ncolors);
    v.push(8);
    v.push(0); // ncmap
    v.push(0); // cmaplen
    v.push(0); // background stand-in pad
    v
}

// ── Header negatives ─────────────────────────────────────────────────

#[test]
fn rejects_bad_magic() {
    assert!(matches!(
        decode(&[0xFF, 0xFF, 0x00, 0x00], Unstoppable),
        Err(RleError::BadMagic)
    ));
    assert!(matches!(decode(&[], Unstoppable), Err(RleError::BadMagic)));
}

#[test]
fn rejects_invalid_ncolors() {
    let head = no_bg_head(4, 4, 4, 0);
    assert!(matches!(
        decode(&head, Unstoppable),
        Err(RleError::InvalidNcolors(4))
    ));
}

#[test]
fn rejects_invalid_pixelbits() {
    let mut head = no_bg_head(4, 4, 3, 0);
    head[12] = 16;
    assert!(matches!(
        decode(&head, Unstoppable),
        Err(RleError::InvalidPixelbits(16))
    ));
}

#[test]
fn rejects_truncated_header() {
    assert!(matches!(
        decode(&[0x52, 0xCC], Unstoppable),
        Err(RleError::HeaderTruncated)
    ));
    // Head cut inside the fixed fields
    assert!(matches!(
        decode(&[0x52, 0xCC, 0, 0, 0, 0, 4, 0], Unstoppable),
        Err(RleError::HeaderTruncated)
    ));
}

#[test]
fn rejects_zero_dimension() {
    let head = no_bg_head(0, 4, 3, 0);
    assert!(matches!(
        decode(&head, Unstoppable),
        Err(RleError::DimTooLarge { width: 0, .. })
    ));
}

#[test]
fn huge_dims_rejected_before_alloc() {
    // 32767 * 32767 * 3 bytes is over the 1 GiB cap
    let head = no_bg_head(32767, 32767, 3, 0);
    assert!(matches!(
        decode(&head, Unstoppable),
        Err(RleError::AllocTooLarge { .. })
    ));
}

#[test]
fn oversized_colormap_rejected() {
    let mut head = no_bg_head(4, 4, 3, 0);
    head[13] = 4; // ncmap
    assert!(matches!(
        decode(&head, Unstoppable),
        Err(RleError::ColormapTooLarge)
    ));
}

// ── Header features ──────────────────────────────────────────────────

#[test]
fn background_block_parity_for_two_channels() {
    let mut header = Header::new(3, 2, 2);
    header.set_background(&[50, 60]);
    let img = Image::allocate(header).unwrap();
    let encoded = encode(&img, BackgroundMode::SaveAll, Unstoppable).unwrap();

    // Even channel count pads the background block to odd length.
    assert_eq!(&encoded[15..18], &[50, 60, 0]);

    let decoded = decode(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.header.background, [50, 60]);
    assert_eq!(decoded.pixels, img.pixels);
}

#[test]
fn colormap_is_loaded_and_preserved() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data[13] = 1; // ncmap
    data[14] = 2; // cmaplen: 4 entries
    for entry in [0x0100u16, 0x0200, 0x0300, 0x0400] {
        data.extend_from_slice(&entry.to_le_bytes());
    }
    data.push(0x06); // EOF

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.header.ncmap, 1);
    assert_eq!(decoded.header.colormap, [0x0100, 0x0200, 0x0300, 0x0400]);
}

#[test]
fn comment_block_roundtrip_with_odd_length() {
    let mut header = Header::new(2, 2, 3);
    header.push_comment("image=test");
    header.push_comment("abc"); // total body 15 bytes, odd, forces a pad
    let img = Image::allocate(header).unwrap();

    let encoded = encode(&img, BackgroundMode::SaveAll, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.header.comments, ["image=test", "abc"]);
    assert_eq!(decoded.pixels, img.pixels);
}

#[test]
fn find_comment_matches_key_value() {
    let mut header = Header::new(1, 1, 3);
    header.push_comment("author=me");
    header.push_comment("plain");
    assert_eq!(header.find_comment("author"), Some("me"));
    assert_eq!(header.find_comment("auth"), None);
    assert_eq!(header.find_comment("plain"), None);
}

// ── Validation mapping ───────────────────────────────────────────────

#[test]
fn validate_maps_each_violation() {
    let valid = Header::new(10, 10, 3);
    assert!(valid.validate().is_ok());

    let mut h = valid.clone();
    h.xlen = 0;
    assert!(matches!(h.validate(), Err(RleError::DimTooLarge { .. })));

    let mut h = valid.clone();
    h.ylen = MAX_DIM + 1;
    assert!(matches!(h.validate(), Err(RleError::DimTooLarge { .. })));

    for bad in [0u8, 4, 255] {
        let mut h = valid.clone();
        h.ncolors = bad;
        assert!(matches!(h.validate(), Err(RleError::InvalidNcolors(_))));
    }

    let mut h = valid.clone();
    h.pixelbits = 16;
    assert!(matches!(h.validate(), Err(RleError::InvalidPixelbits(16))));

    // Background too short for ncolors
    let mut h = valid.clone();
    h.flags &= !FLAG_NO_BACKGROUND;
    h.background = vec![128, 128];
    assert!(matches!(h.validate(), Err(RleError::InvalidBgBlock)));

    // Background present although NO_BACKGROUND is set
    let mut h = valid.clone();
    h.background = vec![1, 2, 3];
    assert!(matches!(h.validate(), Err(RleError::InvalidBgBlock)));

    let mut h = valid.clone();
    h.cmaplen = 9;
    assert!(matches!(h.validate(), Err(RleError::ColormapTooLarge)));

    // Declared map size disagrees with the entries present
    let mut h = valid.clone();
    h.ncmap = 1;
    h.cmaplen = 3;
    h.colormap = vec![0; 4];
    assert!(matches!(h.validate(), Err(RleError::ColormapTooLarge)));

    let mut h = valid.clone();
    h.push_comment("x".repeat(70_000));
    assert!(matches!(h.validate(), Err(RleError::CommentTooLarge)));
}

// ── Decoder state machine ────────────────────────────────────────────

#[test]
fn first_set_color_zero_does_not_advance_scanline() {
    let mut data = no_bg_head(2, 2, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]); // SET_COLOR(0): no channel yet
    data.extend_from_slice(&[0x05, 0x01, 0x07, 0x00]); // RUN_DATA(2, 7)
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [7, 7, 0, 0], "run must land in row 0");
}

#[test]
fn set_color_zero_after_channel_advances_scanline() {
    let mut data = no_bg_head(2, 2, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]); // row 0
    data.extend_from_slice(&[0x05, 0x01, 0x07, 0x00]);
    data.extend_from_slice(&[0x01, 0x00]); // delimiter: row 1
    data.extend_from_slice(&[0x05, 0x01, 0x09, 0x00]);
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [7, 7, 9, 9]);
}

#[test]
fn set_color_nonzero_does_not_advance_scanline() {
    let mut data = no_bg_head(2, 1, 3, 0);
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x01, 0x11, 0x00]); // R
    data.extend_from_slice(&[0x01, 0x01, 0x05, 0x01, 0x22, 0x00]); // G, same row
    data.extend_from_slice(&[0x01, 0x02, 0x05, 0x01, 0x33, 0x00]); // B, same row
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [0x11, 0x22, 0x33, 0x11, 0x22, 0x33]);
}

#[test]
fn skip_lines_mid_scanline_completes_the_row_first() {
    let mut data = no_bg_head(3, 3, 1, 0);
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x02, 0x01, 0x00]); // row 0 = 1s
    data.extend_from_slice(&[0x00, 0x01]); // SKIP_LINES(1): finish row 0, skip row 1
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x02, 0x09, 0x00]); // row 2 = 9s
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [1, 1, 1, 0, 0, 0, 9, 9, 9]);
}

#[test]
fn skip_pixels_offsets_the_write() {
    let mut data = no_bg_head(5, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]);
    data.extend_from_slice(&[0x02, 0x02]); // SKIP_PIXELS(2)
    data.extend_from_slice(&[0x03, 0x00, 0x42, 0x00]); // BYTE_DATA(1) + filler
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [0, 0, 0x42, 0, 0]);
}

#[test]
fn alpha_plane_addressed_as_channel_255() {
    let mut data = no_bg_head(2, 1, 3, FLAG_ALPHA);
    data.extend_from_slice(&[0x01, 0xFF]); // SET_COLOR(255) -> alpha
    data.extend_from_slice(&[0x05, 0x01, 0x4D, 0x00]); // RUN_DATA(2, 77)
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    // colour planes stay at the zero pre-fill, alpha carries the run
    assert_eq!(decoded.pixels, [0, 0, 0, 77, 0, 0, 0, 77]);
}

#[test]
fn channel_255_without_alpha_discards_writes() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0xFF, 0x05, 0x01, 0x4D, 0x00]);
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [0, 0]);
}

// ── Bounds clamping ──────────────────────────────────────────────────

#[test]
fn run_beyond_width_is_clamped() {
    let mut data = no_bg_head(4, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]);
    data.extend_from_slice(&[0x05, 0x09, 0x07, 0x00]); // RUN_DATA(10) on a 4-wide row
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [7, 7, 7, 7]);
}

#[test]
fn byte_data_beyond_width_consumes_but_discards() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]);
    data.extend_from_slice(&[0x03, 0x03, 0xDE, 0xAD, 0xBE, 0xEF]); // BYTE_DATA(4)
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [0xDE, 0xAD]);
}

#[test]
fn skip_lines_beyond_height_is_tolerated() {
    let mut data = no_bg_head(2, 2, 1, 0);
    data.extend_from_slice(&[0x00, 0x64]); // SKIP_LINES(100)
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x01, 0x07, 0x00]); // discarded
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [0, 0, 0, 0]);
}

// ── Stream termination and malformed streams ─────────────────────────

#[test]
fn clean_end_without_eof_opcode() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x01, 0x07, 0x00]);
    // no EOF opcode: input simply ends at an opcode boundary

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.pixels, [7, 7]);
}

#[test]
fn eof_ignores_long_flag() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.push(0x46);
    assert!(decode(&data, Unstoppable).is_ok());
}

#[test]
fn truncated_byte_data_literals() {
    let mut data = no_bg_head(8, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]);
    data.extend_from_slice(&[0x03, 0x06, 1, 2, 3, 4, 5]); // declares 7, supplies 5
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::TruncatedOpcode)
    ));
}

#[test]
fn truncated_byte_data_filler() {
    let mut data = no_bg_head(4, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00]);
    data.extend_from_slice(&[0x03, 0x02, 1, 2, 3]); // odd count, filler missing
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::TruncatedOpcode)
    ));
}

#[test]
fn truncated_run_value_word() {
    let mut data = no_bg_head(4, 1, 1, 0);
    data.extend_from_slice(&[0x01, 0x00, 0x05, 0x01, 0x07]); // value word cut short
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::TruncatedOpcode)
    ));
}

#[test]
fn unknown_opcode_tag() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.extend_from_slice(&[0x04, 0x00]);
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::OpcodeUnknown(0x04))
    ));
}

#[test]
fn long_form_set_color_is_unknown() {
    let mut data = no_bg_head(2, 1, 1, 0);
    data.extend_from_slice(&[0x41, 0x00, 0x00]);
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::OpcodeUnknown(0x41))
    ));
}

#[test]
fn opcode_budget_guarantees_progress() {
    let mut data = no_bg_head(1, 1, 1, 0);
    // 16 * 1 * 1 ops allowed; feed more zero-length skips than that
    for _ in 0..20 {
        data.extend_from_slice(&[0x02, 0x00]);
    }
    assert!(matches!(
        decode(&data, Unstoppable),
        Err(RleError::OpCountExceeded)
    ));
}

// ── Big-endian streams ───────────────────────────────────────────────

#[test]
fn big_endian_header_and_operands() {
    let mut data = vec![0xCC, 0x52]; // big-endian magic
    data.extend_from_slice(&0u16.to_be_bytes()); // xpos
    data.extend_from_slice(&0u16.to_be_bytes()); // ypos
    data.extend_from_slice(&3u16.to_be_bytes()); // xlen
    data.extend_from_slice(&1u16.to_be_bytes()); // ylen
    data.extend_from_slice(&[FLAG_NO_BACKGROUND, 1, 8, 0, 0, 0]);
    data.extend_from_slice(&[0x01, 0x00]); // SET_COLOR(0)
    data.extend_from_slice(&[0x45, 0x00, 0x02]); // long RUN_DATA, count 3
    data.extend_from_slice(&[0x00, 0x07]); // value word, low byte 7
    data.push(0x06);

    let decoded = decode(&data, Unstoppable).unwrap();
    assert_eq!(decoded.header.endian, Endian::Big);
    assert_eq!(decoded.pixels, [7, 7, 7]);
}

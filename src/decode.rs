//! Single-pass opcode interpreter.
//!
//! Decoding drives a `(scan_x, scan_y, channel)` automaton over the opcode
//! stream. The format has no end-of-scanline opcode: a SET_COLOR(0) issued
//! while any channel is selected is the scanline delimiter and advances
//! `scan_y`. SKIP opcodes move the position without touching the buffer,
//! which is why [`Image::allocate`] pre-fills it.

use enough::Stop;

use crate::error::RleError;
use crate::header::read_header;
use crate::image::Image;
use crate::limits::{Limits, MAX_OPS_PER_ROW_FACTOR};
use crate::stream::{op, Cursor, Endian};

/// Scan positions stay within the coordinate space of the header fields.
const MAX_SCAN: u64 = u32::MAX as u64;

pub(crate) fn decode_image(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, RleError> {
    let mut cur = Cursor::new(data);
    let header = read_header(&mut cur)?;
    let mut image = Image::allocate_with_limits(header, limits)?;

    stop.check()?;
    run_opcodes(&mut cur, &mut image, stop)?;
    Ok(image)
}

fn run_opcodes(cur: &mut Cursor<'_>, image: &mut Image, stop: &dyn Stop) -> Result<(), RleError> {
    let w = image.header.width();
    let h = image.header.height();
    let channels = image.header.channels();
    let ncolors = usize::from(image.header.ncolors);
    let has_alpha = image.header.has_alpha();
    let endian = image.header.endian;
    let pixels = &mut image.pixels;

    let max_ops = MAX_OPS_PER_ROW_FACTOR * w as u64 * h as u64;
    let mut ops: u64 = 0;

    // Positions are relative to (xpos, ypos); -1 means no channel selected.
    let mut scan_x: u64 = 0;
    let mut scan_y: u64 = 0;
    let mut channel: i32 = -1;

    loop {
        // Input exhausted at an opcode boundary is a clean end of image;
        // exhaustion anywhere below is a truncation.
        if cur.is_empty() {
            return Ok(());
        }
        ops += 1;
        if ops > max_ops {
            return Err(RleError::OpCountExceeded);
        }
        if ops % 1024 == 0 {
            stop.check()?;
        }

        let opc = cur.read_u8().ok_or(RleError::TruncatedOpcode)?;
        let long = opc & op::LONG != 0;
        let tag = opc & !op::LONG;

        match tag {
            op::SKIP_LINES => {
                let lines = read_operand(cur, long, endian)?;
                if channel >= 0 {
                    // Finish the scanline in progress before skipping.
                    scan_y += 1;
                }
                scan_y += u64::from(lines);
                scan_x = 0;
                channel = -1;
            }
            op::SET_COLOR => {
                if long {
                    return Err(RleError::OpcodeUnknown(opc));
                }
                let c = cur.read_u8().ok_or(RleError::TruncatedOpcode)?;
                let new_channel = if c == 255 && has_alpha {
                    ncolors as i32
                } else {
                    i32::from(c)
                };
                // Selecting channel 0 after any channel delimits a scanline.
                if new_channel == 0 && channel >= 0 {
                    scan_y += 1;
                }
                channel = new_channel;
                scan_x = 0;
            }
            op::SKIP_PIXELS => {
                let skip = read_operand(cur, long, endian)?;
                scan_x += u64::from(skip);
            }
            op::BYTE_DATA => {
                let count = usize::from(read_operand(cur, long, endian)?) + 1;
                let data = cur.read_slice(count).ok_or(RleError::TruncatedOpcode)?;
                if count % 2 == 1 {
                    cur.read_u8().ok_or(RleError::TruncatedOpcode)?;
                }
                if (scan_y as usize) < h && (0..channels as i32).contains(&channel) {
                    let col = scan_x as usize;
                    if col < w {
                        // Bytes past the right edge were consumed above and
                        // are dropped here.
                        let writable = count.min(w - col);
                        let base = (scan_y as usize * w + col) * channels + channel as usize;
                        for (i, &b) in data[..writable].iter().enumerate() {
                            pixels[base + i * channels] = b;
                        }
                    }
                }
                scan_x += count as u64;
            }
            op::RUN_DATA => {
                let count = u64::from(read_operand(cur, long, endian)?) + 1;
                let word = cur.read_u16(endian).ok_or(RleError::TruncatedOpcode)?;
                let value = (word & 0xFF) as u8;
                if (scan_y as usize) < h && (0..channels as i32).contains(&channel) {
                    let col = scan_x as usize;
                    if col < w {
                        let writable = (count as usize).min(w - col);
                        let base = (scan_y as usize * w + col) * channels + channel as usize;
                        for i in 0..writable {
                            pixels[base + i * channels] = value;
                        }
                    }
                }
                scan_x += count;
            }
            op::EOF => return Ok(()),
            _ => return Err(RleError::OpcodeUnknown(opc)),
        }

        if scan_x > MAX_SCAN || scan_y > MAX_SCAN {
            return Err(RleError::OpcodeOverflow);
        }
    }
}

fn read_operand(cur: &mut Cursor<'_>, long: bool, endian: Endian) -> Result<u16, RleError> {
    if long {
        cur.read_u16(endian).ok_or(RleError::TruncatedOpcode)
    } else {
        cur.read_u8().map(u16::from).ok_or(RleError::TruncatedOpcode)
    }
}

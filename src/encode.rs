//! Opcode stream emission.
//!
//! The encoder walks scanlines in ascending y and, within each, the colour
//! planes then alpha. Each encoded row opens with SET_COLOR(0), which is
//! what delimits scanlines on the decode side, so no end-of-row opcode is
//! ever emitted.

use alloc::vec::Vec;

use enough::Stop;

use crate::error::RleError;
use crate::header::{write_header, Header, FLAG_CLEAR_FIRST};
use crate::image::{buffer_len, Image};
use crate::limits::MAX_OPS_PER_ROW_FACTOR;
use crate::stream::{op, put_u16, Endian};

/// How the encoder treats pixels matching the background colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    /// Encode every pixel; no skip opcodes.
    #[default]
    SaveAll,
    /// Elide background rows and pixel runs, relying on the decoder
    /// pre-fill.
    Overlay,
    /// Like `Overlay`, and additionally stamp [`FLAG_CLEAR_FIRST`].
    Clear,
}

/// Largest pixel count one opcode can carry (long form, count - 1 operand).
const MAX_COUNT: usize = 65536;
/// Largest skip one opcode can carry (the operand is the count itself).
const MAX_SKIP: u64 = 65535;

pub(crate) fn encode_image(
    image: &Image,
    mode: BackgroundMode,
    stop: &dyn Stop,
) -> Result<Vec<u8>, RleError> {
    let mut header = image.header.clone();
    if mode == BackgroundMode::Clear {
        header.flags |= FLAG_CLEAR_FIRST;
    }

    let expected = buffer_len(&header)?;
    if image.pixels.len() < expected {
        return Err(RleError::BufferTooSmall {
            needed: expected,
            actual: image.pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(expected / 4 + 64);
    write_header(&mut out, &header)?;

    stop.check()?;

    let elide = mode != BackgroundMode::SaveAll && !header.no_background();
    let h = header.height();
    let channels = header.channels();
    let ncolors = usize::from(header.ncolors);

    let mut pending_lines: u64 = 0;
    for y in 0..h {
        if y % 16 == 0 {
            stop.check()?;
        }
        if elide && image.row_is_background(y) {
            pending_lines += 1;
            continue;
        }
        flush_skip_lines(&mut out, header.endian, &mut pending_lines);

        let mut budget = RowBudget::new(&header);
        for c in 0..channels {
            let code = if c < ncolors { c as u8 } else { 255 };
            budget.charge()?;
            out.push(op::SET_COLOR);
            out.push(code);
            encode_channel_row(&mut out, image, y, c, elide, &mut budget)?;
        }
    }
    // Trailing background rows need no opcode; the pre-fill covers them.

    out.push(op::EOF);
    Ok(out)
}

/// Per-row opcode ceiling guaranteeing forward progress.
struct RowBudget {
    left: u64,
}

impl RowBudget {
    fn new(header: &Header) -> Self {
        Self {
            left: MAX_OPS_PER_ROW_FACTOR * header.width() as u64,
        }
    }

    fn charge(&mut self) -> Result<(), RleError> {
        if self.left == 0 {
            return Err(RleError::OpCountExceeded);
        }
        self.left -= 1;
        Ok(())
    }
}

/// Emit the opcodes for channel `c` of row `y`: background skips, runs of
/// identical bytes, and literal spans.
fn encode_channel_row(
    out: &mut Vec<u8>,
    image: &Image,
    y: usize,
    c: usize,
    elide: bool,
    budget: &mut RowBudget,
) -> Result<(), RleError> {
    let w = image.width();
    let channels = image.header.channels();
    let endian = image.header.endian;
    let row = &image.pixels[y * w * channels..(y + 1) * w * channels];
    let at = |x: usize| row[x * channels + c];
    let skippable = |x: usize| elide && image.pixel_is_background(x, y);

    let mut x = 0usize;
    let mut pending_skip: u64 = 0;
    while x < w {
        if skippable(x) {
            pending_skip += 1;
            x += 1;
            continue;
        }
        while pending_skip > 0 {
            let chunk = pending_skip.min(MAX_SKIP);
            budget.charge()?;
            put_count_op(out, endian, op::SKIP_PIXELS, chunk as u16);
            pending_skip -= chunk;
        }

        let value = at(x);
        let mut run = 1;
        while x + run < w && !skippable(x + run) && at(x + run) == value {
            run += 1;
        }
        if run >= 2 {
            let mut left = run;
            while left > 0 {
                let chunk = left.min(MAX_COUNT);
                budget.charge()?;
                put_run(out, endian, chunk, value);
                left -= chunk;
            }
            x += run;
        } else {
            // Literal span: up to the next background pixel or the start
            // of a run.
            let mut lit = 1;
            while x + lit < w && !skippable(x + lit) {
                let nx = x + lit;
                if nx + 1 < w && !skippable(nx + 1) && at(nx) == at(nx + 1) {
                    break;
                }
                lit += 1;
            }
            let mut start = x;
            let mut left = lit;
            while left > 0 {
                let chunk = left.min(MAX_COUNT);
                budget.charge()?;
                put_literals(out, endian, row, channels, c, start, chunk);
                start += chunk;
                left -= chunk;
            }
            x += lit;
        }
    }
    // A trailing background span is dropped, same as trailing rows.
    Ok(())
}

fn flush_skip_lines(out: &mut Vec<u8>, endian: Endian, pending: &mut u64) {
    while *pending > 0 {
        let chunk = (*pending).min(MAX_SKIP);
        put_count_op(out, endian, op::SKIP_LINES, chunk as u16);
        *pending -= chunk;
    }
}

/// SKIP_LINES / SKIP_PIXELS: the operand is the count itself.
fn put_count_op(out: &mut Vec<u8>, endian: Endian, tag: u8, count: u16) {
    if count <= 255 {
        out.push(tag);
        out.push(count as u8);
    } else {
        out.push(tag | op::LONG);
        put_u16(out, endian, count);
    }
}

/// RUN_DATA: operand is count - 1; the value rides in the low byte of a
/// u16 word.
fn put_run(out: &mut Vec<u8>, endian: Endian, count: usize, value: u8) {
    if count <= 256 {
        out.push(op::RUN_DATA);
        out.push((count - 1) as u8);
    } else {
        out.push(op::RUN_DATA | op::LONG);
        put_u16(out, endian, (count - 1) as u16);
    }
    put_u16(out, endian, u16::from(value));
}

/// BYTE_DATA: operand is count - 1, then the literals, padded to an even
/// byte count.
fn put_literals(
    out: &mut Vec<u8>,
    endian: Endian,
    row: &[u8],
    channels: usize,
    c: usize,
    start: usize,
    count: usize,
) {
    if count <= 256 {
        out.push(op::BYTE_DATA);
        out.push((count - 1) as u8);
    } else {
        out.push(op::BYTE_DATA | op::LONG);
        put_u16(out, endian, (count - 1) as u16);
    }
    for x in start..start + count {
        out.push(row[x * channels + c]);
    }
    if count % 2 == 1 {
        out.push(0);
    }
}

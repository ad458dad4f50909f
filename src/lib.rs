//! # zenrle
//!
//! Utah RLE image format decoder and encoder.
//!
//! A hardened, portable codec for the classic run-length encoded raster
//! container: 8-bit pixels, 1–3 colour channels plus optional alpha,
//! per-channel scanline coding, optional background elision, colour map
//! and comment blocks, and per-file endianness stamped by the magic.
//!
//! ## Decoding
//!
//! Decoding consumes a byte slice and produces an [`Image`] whose buffer is
//! pre-filled with the declared background (and opaque alpha) before the
//! opcode stream is applied; skip opcodes rely on that pre-fill.
//!
//! ## Encoding
//!
//! Encoding walks the buffer row by row, channel by channel, choosing
//! between literal, run, and skip opcodes. [`BackgroundMode`] selects
//! whether background-coloured pixels are elided.
//!
//! ```
//! use zenrle::{BackgroundMode, Header, Image, Unstoppable};
//!
//! let mut image = Image::allocate(Header::new(2, 1, 3))?;
//! image.pixels.copy_from_slice(&[255, 0, 0, 0, 255, 0]);
//!
//! let encoded = zenrle::encode(&image, BackgroundMode::SaveAll, Unstoppable)?;
//! let decoded = zenrle::decode(&encoded, Unstoppable)?;
//! assert_eq!(decoded.pixels, image.pixels);
//! # Ok::<(), zenrle::RleError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "rgb")]
use rgb::{AsPixels as _, ComponentBytes as _};

mod decode;
mod encode;
mod error;
mod header;
mod image;
mod limits;
mod stream;

pub use encode::BackgroundMode;
pub use enough::{Stop, Unstoppable};
pub use error::RleError;
pub use header::{
    Header, FLAG_ALPHA, FLAG_CLEAR_FIRST, FLAG_COMMENT, FLAG_NO_BACKGROUND, MAGIC,
};
pub use image::Image;
pub use limits::{Limits, MAX_ALLOC_BYTES, MAX_COMMENT_BYTES, MAX_DIM, MAX_OPS_PER_ROW_FACTOR};
pub use stream::Endian;

/// 8-bit RGB pixel.
#[cfg(feature = "rgb")]
pub type RGB8 = rgb::RGB<u8>;
/// 8-bit RGBA pixel.
#[cfg(feature = "rgb")]
pub type RGBA8 = rgb::RGBA<u8>;

// ── Format detection ──────────────────────────────────────────────────

/// Whether `data` starts with the RLE magic in either byte order.
pub fn is_rle(data: &[u8]) -> bool {
    matches!(data, [0x52, 0xCC, ..] | [0xCC, 0x52, ..])
}

// ── Decode ────────────────────────────────────────────────────────────

/// Decode an RLE file into an [`Image`].
pub fn decode(data: &[u8], stop: impl Stop) -> Result<Image, RleError> {
    decode::decode_image(data, None, &stop)
}

/// Decode with resource limits tightening the crate caps.
pub fn decode_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<Image, RleError> {
    decode::decode_image(data, Some(limits), &stop)
}

// ── Encode ────────────────────────────────────────────────────────────

/// Encode an [`Image`] into a complete RLE file.
///
/// The image header is emitted as-is apart from [`FLAG_CLEAR_FIRST`],
/// which [`BackgroundMode::Clear`] stamps on. The header's endianness
/// stamp chooses the output byte order.
pub fn encode(image: &Image, mode: BackgroundMode, stop: impl Stop) -> Result<Vec<u8>, RleError> {
    encode::encode_image(image, mode, &stop)
}

// ── Interleaved RGB convenience ───────────────────────────────────────

/// Decoded interleaved output of [`decode_rgb`].
///
/// `pixels` holds `width * height` pixels of 3 bytes, or 4 when
/// `has_alpha` is set. Images with fewer than three colour channels are
/// expanded by replicating the last channel.
#[derive(Clone, Debug)]
pub struct RgbOutput {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub comments: Vec<String>,
}

/// Encode interleaved RGB (or RGBA when `alpha` is set) bytes.
///
/// `background` enables the background block; pair it with
/// [`BackgroundMode::Overlay`] or [`BackgroundMode::Clear`] to elide
/// background pixels.
#[allow(clippy::too_many_arguments)]
pub fn encode_rgb(
    pixels: &[u8],
    width: u16,
    height: u16,
    comments: &[&str],
    background: Option<[u8; 3]>,
    alpha: bool,
    mode: BackgroundMode,
    stop: impl Stop,
) -> Result<Vec<u8>, RleError> {
    let mut header = Header::new(width, height, 3);
    if let Some(bg) = background {
        header.set_background(&bg);
    }
    if alpha {
        header.flags |= FLAG_ALPHA;
    }
    for &c in comments {
        header.push_comment(c);
    }
    let image = Image {
        header,
        pixels: pixels.to_vec(),
    };
    encode::encode_image(&image, mode, &stop)
}

/// Decode to interleaved RGB/RGBA bytes, expanding narrower images.
pub fn decode_rgb(data: &[u8], stop: impl Stop) -> Result<RgbOutput, RleError> {
    let image = decode::decode_image(data, None, &stop)?;
    let ncolors = usize::from(image.header.ncolors);
    let has_alpha = image.header.has_alpha();
    let width = image.width() as u32;
    let height = image.height() as u32;
    let comments = image.header.comments.clone();

    let pixels = if ncolors == 3 {
        image.pixels
    } else {
        let channels = image.header.channels();
        let out_channels = 3 + usize::from(has_alpha);
        let mut out = Vec::with_capacity(image.width() * image.height() * out_channels);
        for px in image.pixels.chunks_exact(channels) {
            for c in 0..3 {
                out.push(px[c.min(ncolors - 1)]);
            }
            if has_alpha {
                out.push(px[ncolors]);
            }
        }
        out
    };

    Ok(RgbOutput {
        pixels,
        width,
        height,
        has_alpha,
        comments,
    })
}

// ── Typed pixel API (rgb feature) ────────────────────────────────────

/// Decode to typed RGB pixels. The image must have exactly three colour
/// channels and no alpha.
#[cfg(feature = "rgb")]
pub fn decode_rgb8_pixels(data: &[u8], stop: impl Stop) -> Result<(Vec<RGB8>, u32, u32), RleError> {
    let image = decode(data, stop)?;
    if image.header.channels() != 3 {
        return Err(RleError::ChannelMismatch {
            expected: 3,
            actual: image.header.channels(),
        });
    }
    let pixels: &[RGB8] = image.pixels.as_pixels();
    Ok((
        pixels.to_vec(),
        image.width() as u32,
        image.height() as u32,
    ))
}

/// Decode to typed RGBA pixels. The image must have three colour channels
/// plus alpha.
#[cfg(feature = "rgb")]
pub fn decode_rgba8_pixels(
    data: &[u8],
    stop: impl Stop,
) -> Result<(Vec<RGBA8>, u32, u32), RleError> {
    let image = decode(data, stop)?;
    if image.header.ncolors != 3 || !image.header.has_alpha() {
        return Err(RleError::ChannelMismatch {
            expected: 4,
            actual: image.header.channels(),
        });
    }
    let pixels: &[RGBA8] = image.pixels.as_pixels();
    Ok((
        pixels.to_vec(),
        image.width() as u32,
        image.height() as u32,
    ))
}

/// Encode typed RGB pixels.
#[cfg(feature = "rgb")]
pub fn encode_rgb8_pixels(
    pixels: &[RGB8],
    width: u16,
    height: u16,
    mode: BackgroundMode,
    stop: impl Stop,
) -> Result<Vec<u8>, RleError> {
    encode_rgb(pixels.as_bytes(), width, height, &[], None, false, mode, stop)
}

/// Encode typed RGBA pixels.
#[cfg(feature = "rgb")]
pub fn encode_rgba8_pixels(
    pixels: &[RGBA8],
    width: u16,
    height: u16,
    mode: BackgroundMode,
    stop: impl Stop,
) -> Result<Vec<u8>, RleError> {
    encode_rgb(pixels.as_bytes(), width, height, &[], None, true, mode, stop)
}

// ── ImgVec/ImgRef API (imgref feature) ───────────────────────────────

/// Decode to an [`imgref::ImgVec`] of RGB pixels.
#[cfg(feature = "imgref")]
pub fn decode_rgb8_img(data: &[u8], stop: impl Stop) -> Result<imgref::ImgVec<RGB8>, RleError> {
    let (pixels, w, h) = decode_rgb8_pixels(data, stop)?;
    Ok(imgref::ImgVec::new(pixels, w as usize, h as usize))
}

/// Decode to an [`imgref::ImgVec`] of RGBA pixels.
#[cfg(feature = "imgref")]
pub fn decode_rgba8_img(data: &[u8], stop: impl Stop) -> Result<imgref::ImgVec<RGBA8>, RleError> {
    let (pixels, w, h) = decode_rgba8_pixels(data, stop)?;
    Ok(imgref::ImgVec::new(pixels, w as usize, h as usize))
}

/// Encode an [`imgref::ImgRef`] of RGB pixels, handling arbitrary stride.
#[cfg(feature = "imgref")]
pub fn encode_rgb8_img(
    img: imgref::ImgRef<'_, RGB8>,
    mode: BackgroundMode,
    stop: impl Stop,
) -> Result<Vec<u8>, RleError> {
    let (width, height) = checked_dims(img.width(), img.height())?;
    let mut bytes = Vec::with_capacity(img.width() * img.height() * 3);
    for row in img.rows() {
        bytes.extend_from_slice(row.as_bytes());
    }
    encode_rgb(&bytes, width, height, &[], None, false, mode, stop)
}

#[cfg(feature = "imgref")]
fn checked_dims(w: usize, h: usize) -> Result<(u16, u16), RleError> {
    let width = u16::try_from(w).unwrap_or(u16::MAX);
    let height = u16::try_from(h).unwrap_or(u16::MAX);
    if usize::from(width) != w || usize::from(height) != h {
        return Err(RleError::DimTooLarge { width, height });
    }
    Ok((width, height))
}

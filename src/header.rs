//! Header codec: the fixed head plus the background, colour-map, and
//! comment sub-blocks.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::RleError;
use crate::limits::{MAX_COMMENT_BYTES, MAX_DIM};
use crate::stream::{put_u16, Cursor, Endian};

/// File magic, 0xCC52 in the stamped byte order.
pub const MAGIC: u16 = 0xCC52;

/// Display hint: clear the target before painting. No encoding effect.
pub const FLAG_CLEAR_FIRST: u8 = 0x01;
/// No background block; decoders pre-fill colour planes with zero.
pub const FLAG_NO_BACKGROUND: u8 = 0x02;
/// An alpha plane follows the colour planes in every scanline.
pub const FLAG_ALPHA: u8 = 0x04;
/// A comment block follows the colour map.
pub const FLAG_COMMENT: u8 = 0x08;

/// Parsed image header.
///
/// `background` must hold exactly `ncolors` values when
/// [`FLAG_NO_BACKGROUND`] is clear and be empty when it is set.
/// `comments` are written only while [`FLAG_COMMENT`] is set; use
/// [`Header::push_comment`] to keep the flag in sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub xpos: i16,
    pub ypos: i16,
    pub xlen: u16,
    pub ylen: u16,
    pub flags: u8,
    pub ncolors: u8,
    pub pixelbits: u8,
    pub ncmap: u8,
    /// log2 of colour-map entries per plane.
    pub cmaplen: u8,
    pub background: Vec<u8>,
    pub colormap: Vec<u16>,
    pub comments: Vec<String>,
    /// Byte order stamped by the magic; preserved through decode so a
    /// re-encode keeps the original stamp.
    pub endian: Endian,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            xpos: 0,
            ypos: 0,
            xlen: 0,
            ylen: 0,
            flags: FLAG_NO_BACKGROUND,
            ncolors: 3,
            pixelbits: 8,
            ncmap: 0,
            cmaplen: 0,
            background: Vec::new(),
            colormap: Vec::new(),
            comments: Vec::new(),
            endian: Endian::Little,
        }
    }
}

impl Header {
    /// Header for a new image with no background and no alpha.
    pub fn new(width: u16, height: u16, ncolors: u8) -> Self {
        Self {
            xlen: width,
            ylen: height,
            ncolors,
            ..Self::default()
        }
    }

    pub fn width(&self) -> usize {
        usize::from(self.xlen)
    }

    pub fn height(&self) -> usize {
        usize::from(self.ylen)
    }

    pub fn has_alpha(&self) -> bool {
        self.flags & FLAG_ALPHA != 0
    }

    pub fn no_background(&self) -> bool {
        self.flags & FLAG_NO_BACKGROUND != 0
    }

    pub fn has_comments(&self) -> bool {
        self.flags & FLAG_COMMENT != 0
    }

    /// Planes per pixel: the colour planes plus the alpha plane if present.
    pub fn channels(&self) -> usize {
        usize::from(self.ncolors) + usize::from(self.has_alpha())
    }

    /// Set the background colour and clear [`FLAG_NO_BACKGROUND`].
    pub fn set_background(&mut self, background: &[u8]) {
        self.background = background.to_vec();
        self.flags &= !FLAG_NO_BACKGROUND;
    }

    /// Append a comment string and set [`FLAG_COMMENT`].
    pub fn push_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
        self.flags |= FLAG_COMMENT;
    }

    /// Look up a `key=value` comment, returning the value.
    pub fn find_comment(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|c| {
            let rest = c.strip_prefix(key)?;
            rest.strip_prefix('=')
        })
    }

    /// Byte length of the encoded comment block body (excluding the u16
    /// length field and trailing pad): each string plus its NUL.
    fn comment_block_len(&self) -> usize {
        self.comments.iter().map(|c| c.len() + 1).sum()
    }

    /// Check every emission invariant, mapping each violation onto its
    /// error kind.
    pub fn validate(&self) -> Result<(), RleError> {
        if self.xlen == 0 || self.ylen == 0 || self.xlen > MAX_DIM || self.ylen > MAX_DIM {
            return Err(RleError::DimTooLarge {
                width: self.xlen,
                height: self.ylen,
            });
        }
        if !(1..=3).contains(&self.ncolors) {
            return Err(RleError::InvalidNcolors(self.ncolors));
        }
        if self.pixelbits != 8 {
            return Err(RleError::InvalidPixelbits(self.pixelbits));
        }
        if self.no_background() {
            if !self.background.is_empty() {
                return Err(RleError::InvalidBgBlock);
            }
        } else if self.background.len() != usize::from(self.ncolors) {
            return Err(RleError::InvalidBgBlock);
        }
        if self.ncmap > 3 || self.cmaplen > 8 {
            return Err(RleError::ColormapTooLarge);
        }
        if self.colormap.len() != colormap_entries(self.ncmap, self.cmaplen) {
            return Err(RleError::ColormapTooLarge);
        }
        let comment_len = self.comment_block_len();
        if self.has_comments()
            && (comment_len > MAX_COMMENT_BYTES || comment_len > usize::from(u16::MAX))
        {
            return Err(RleError::CommentTooLarge);
        }
        Ok(())
    }
}

fn colormap_entries(ncmap: u8, cmaplen: u8) -> usize {
    if ncmap == 0 {
        0
    } else {
        usize::from(ncmap) << cmaplen
    }
}

/// Serialise a validated header: fixed head, background block, colour map,
/// comment block.
pub(crate) fn write_header(out: &mut Vec<u8>, h: &Header) -> Result<(), RleError> {
    h.validate()?;

    let e = h.endian;
    put_u16(out, e, MAGIC);
    put_u16(out, e, h.xpos as u16);
    put_u16(out, e, h.ypos as u16);
    put_u16(out, e, h.xlen);
    put_u16(out, e, h.ylen);
    out.push(h.flags);
    out.push(h.ncolors);
    out.push(h.pixelbits);
    out.push(h.ncmap);
    out.push(h.cmaplen);

    if h.no_background() {
        // Single pad byte stands in for the background block.
        out.push(0);
    } else {
        out.extend_from_slice(&h.background);
        if h.ncolors % 2 == 0 {
            out.push(0);
        }
    }

    for &entry in &h.colormap {
        put_u16(out, e, entry);
    }

    if h.has_comments() {
        let len = h.comment_block_len();
        put_u16(out, e, len as u16);
        for c in &h.comments {
            out.extend_from_slice(c.as_bytes());
            out.push(0);
        }
        if len % 2 == 1 {
            out.push(0);
        }
    }

    Ok(())
}

/// Parse the header, detecting endianness from the magic bytes.
pub(crate) fn read_header(cur: &mut Cursor<'_>) -> Result<Header, RleError> {
    let magic = cur.read_array::<2>().ok_or(RleError::BadMagic)?;
    let endian = match magic {
        [0x52, 0xCC] => Endian::Little,
        [0xCC, 0x52] => Endian::Big,
        _ => return Err(RleError::BadMagic),
    };

    let mut h = Header {
        endian,
        ..Header::default()
    };
    h.xpos = cur.read_i16(endian).ok_or(RleError::HeaderTruncated)?;
    h.ypos = cur.read_i16(endian).ok_or(RleError::HeaderTruncated)?;
    h.xlen = cur.read_u16(endian).ok_or(RleError::HeaderTruncated)?;
    h.ylen = cur.read_u16(endian).ok_or(RleError::HeaderTruncated)?;
    let [flags, ncolors, pixelbits, ncmap, cmaplen] =
        cur.read_array::<5>().ok_or(RleError::HeaderTruncated)?;
    h.flags = flags;
    h.ncolors = ncolors;
    h.pixelbits = pixelbits;
    h.ncmap = ncmap;
    h.cmaplen = cmaplen;

    // Reject before sizing any sub-block off untrusted fields.
    if h.xlen == 0 || h.ylen == 0 || h.xlen > MAX_DIM || h.ylen > MAX_DIM {
        return Err(RleError::DimTooLarge {
            width: h.xlen,
            height: h.ylen,
        });
    }
    if !(1..=3).contains(&h.ncolors) {
        return Err(RleError::InvalidNcolors(h.ncolors));
    }
    if h.pixelbits != 8 {
        return Err(RleError::InvalidPixelbits(h.pixelbits));
    }
    if h.ncmap > 3 || h.cmaplen > 8 {
        return Err(RleError::ColormapTooLarge);
    }

    if h.no_background() {
        // The reference writes a pad byte here; consume it, don't seek past.
        cur.read_u8().ok_or(RleError::HeaderTruncated)?;
    } else {
        let bg = cur
            .read_slice(usize::from(h.ncolors))
            .ok_or(RleError::HeaderTruncated)?;
        h.background = bg.to_vec();
        if h.ncolors % 2 == 0 {
            cur.read_u8().ok_or(RleError::HeaderTruncated)?;
        }
    }

    let entries = colormap_entries(h.ncmap, h.cmaplen);
    if entries > 0 {
        let mut colormap = Vec::with_capacity(entries);
        for _ in 0..entries {
            colormap.push(cur.read_u16(endian).ok_or(RleError::HeaderTruncated)?);
        }
        h.colormap = colormap;
    }

    if h.has_comments() {
        let len = usize::from(cur.read_u16(endian).ok_or(RleError::HeaderTruncated)?);
        if len > MAX_COMMENT_BYTES {
            return Err(RleError::CommentTooLarge);
        }
        let body = cur.read_slice(len).ok_or(RleError::HeaderTruncated)?;
        if len % 2 == 1 {
            cur.read_u8().ok_or(RleError::HeaderTruncated)?;
        }
        h.comments = parse_comments(body);
    }

    h.validate()?;
    Ok(h)
}

/// Split a comment block body into its NUL-terminated strings.
fn parse_comments(body: &[u8]) -> Vec<String> {
    let mut comments = Vec::new();
    let mut rest = body;
    while let Some(nul) = rest.iter().position(|&b| b == 0) {
        comments.push(String::from_utf8_lossy(&rest[..nul]).into_owned());
        rest = &rest[nul + 1..];
    }
    if !rest.is_empty() {
        // Tolerate a final string missing its terminator.
        comments.push(String::from_utf8_lossy(rest).into_owned());
    }
    comments
}

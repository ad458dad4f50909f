use crate::error::RleError;

/// Largest accepted value for `xlen` / `ylen`.
pub const MAX_DIM: u16 = 32767;

/// Hard cap on the decoded pixel buffer, in bytes.
pub const MAX_ALLOC_BYTES: u64 = 1 << 30;

/// Hard cap on the encoded comment block, in bytes.
pub const MAX_COMMENT_BYTES: usize = 64 * 1024;

/// Opcode budget multiplier: an encoder may emit at most this many opcodes
/// per `xlen` pixels of row, and a decoder accepts at most this many per
/// `xlen * ylen` pixels of image.
pub const MAX_OPS_PER_ROW_FACTOR: u64 = 16;

/// Resource limits for decode operations, tightening the crate-level caps.
///
/// All fields default to `None` (cap applies unchanged).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum memory bytes for the pixel buffer allocation.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check dimensions against the caller limits.
    pub(crate) fn check(&self, width: u16, height: u16) -> Result<(), RleError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(RleError::DimTooLarge { width, height });
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(RleError::DimTooLarge { width, height });
            }
        }
        if let Some(max_px) = self.max_pixels {
            if u64::from(width) * u64::from(height) > max_px {
                return Err(RleError::PixelsTooLarge);
            }
        }
        Ok(())
    }

    /// Check an allocation size against the caller memory limit.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), RleError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(RleError::AllocTooLarge {
                    bytes: bytes as u64,
                });
            }
        }
        Ok(())
    }
}

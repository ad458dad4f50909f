use enough::StopReason;

/// Errors from RLE decoding and encoding.
///
/// The taxonomy is flat: every failure surfaces as exactly one of these
/// kinds at the public operation boundary, with no chaining.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RleError {
    /// The first two bytes match neither magic byte order.
    #[error("bad magic")]
    BadMagic,

    /// Input ended inside the fixed head or one of its sub-blocks.
    #[error("header truncated")]
    HeaderTruncated,

    /// The stamped endianness is not one this build can decode.
    #[error("unsupported endian")]
    UnsupportedEndian,

    /// `ncolors` outside 1..=3.
    #[error("invalid ncolors: {0}")]
    InvalidNcolors(u8),

    /// `pixelbits` other than 8.
    #[error("invalid pixelbits: {0}")]
    InvalidPixelbits(u8),

    /// Background values inconsistent with the NO_BACKGROUND flag.
    #[error("invalid background block")]
    InvalidBgBlock,

    /// Colour map shape exceeds the format or declared size.
    #[error("colormap too large")]
    ColormapTooLarge,

    /// Encoded comment block exceeds the size cap.
    #[error("comment block too large")]
    CommentTooLarge,

    /// A dimension is zero, over `MAX_DIM`, or over a caller limit.
    #[error("dimensions too large: {width}x{height}")]
    DimTooLarge { width: u16, height: u16 },

    /// Pixel count over a caller limit, or the buffer size overflows.
    #[error("pixel count too large")]
    PixelsTooLarge,

    /// Buffer allocation would exceed the memory cap.
    #[error("allocation exceeds cap: {bytes} bytes")]
    AllocTooLarge { bytes: u64 },

    /// Input ended inside an opcode operand or its literal data.
    #[error("truncated opcode")]
    TruncatedOpcode,

    /// Opcode byte with an unassigned tag, or a long form where none exists.
    #[error("unknown opcode: {0:#04x}")]
    OpcodeUnknown(u8),

    /// An operand drove the scan position out of representable range.
    #[error("opcode operand overflow")]
    OpcodeOverflow,

    /// Opcode budget exhausted without reaching EOF.
    #[error("opcode count exceeded")]
    OpCountExceeded,

    /// Pixel input shorter than `width * height * channels`.
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Typed-pixel access on an image with a different channel count.
    #[error("channel mismatch: expected {expected} channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// Operation cancelled.
    #[error("operation cancelled")]
    Cancelled(StopReason),

    /// Invariant violation that should not be reachable from any input.
    #[error("internal error")]
    Internal,
}

impl From<StopReason> for RleError {
    fn from(r: StopReason) -> Self {
        RleError::Cancelled(r)
    }
}

//! The error surface for the whole crate.
//!
//! Every fallible operation returns `Result<T, CodecError>`. `CodecError`
//! carries one of the four recoverable kinds from the spec's taxonomy plus a
//! reason specific to the subsystem that raised it, and a small owned
//! `Context` record (never a stack trace) with whatever indices were known
//! at the failure site. Nothing in this crate panics on bad input; `Internal`
//! is reserved for invariants that should be unreachable and indicates a bug
//! here, not in the caller's data.
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Indices that were known at the point a `CodecError` was raised.
///
/// Populated progressively as the error bubbles up through the call stack;
/// fields that were never known stay `None`.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub byte_offset: Option<usize>,
    pub table_id: Option<u8>,
    pub block_index: Option<usize>,
    pub scan_number: Option<usize>,
    pub pixel: Option<(u32, u32)>,
}

impl Context {
    pub const fn none() -> Context {
        Context { byte_offset: None, table_id: None, block_index: None, scan_number: None, pixel: None }
    }

    #[must_use]
    pub fn at_offset(mut self, offset: usize) -> Context {
        self.byte_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_table_id(mut self, id: u8) -> Context {
        self.table_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_block(mut self, index: usize) -> Context {
        self.block_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_scan(mut self, scan: usize) -> Context {
        self.scan_number = Some(scan);
        self
    }

    #[must_use]
    pub fn with_pixel(mut self, x: u32, y: u32) -> Context {
        self.pixel = Some((x, y));
        self
    }

    fn write_suffix(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(off) = self.byte_offset {
            write!(f, " (byte offset {off})")?;
        }
        if let Some(id) = self.table_id {
            write!(f, " (table id {id})")?;
        }
        if let Some(idx) = self.block_index {
            write!(f, " (block {idx})")?;
        }
        if let Some(scan) = self.scan_number {
            write!(f, " (scan #{scan})")?;
        }
        if let Some((x, y)) = self.pixel {
            write!(f, " (pixel {x},{y})")?;
        }
        Ok(())
    }
}

/// Reasons a `CodecError::InputInvalid` may be raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputInvalidReason {
    EmptyBuffer,
    BufferLengthMismatch { expected: usize, found: usize },
    QualityOutOfRange(i32),
    NonFiniteAngle,
    ZeroTargetDimension,
    InvalidFillColor,
}

impl Display for InputInvalidReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBuffer => write!(f, "input buffer is empty"),
            Self::BufferLengthMismatch { expected, found } => write!(
                f,
                "buffer length mismatch: expected {expected} bytes, found {found}"
            ),
            Self::QualityOutOfRange(q) => {
                write!(f, "quality {q} is out of range, expected 1..=100")
            }
            Self::NonFiniteAngle => write!(f, "rotation angle is not finite"),
            Self::ZeroTargetDimension => write!(f, "target width or height is zero"),
            Self::InvalidFillColor => write!(f, "fill color must be 4 channel values"),
        }
    }
}

/// Reasons a `CodecError::FormatInvalid` may be raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatInvalidReason {
    MissingSoi,
    MissingEoi,
    InvalidMarker(u8),
    Huffman(HuffmanError),
    Quant(QuantError),
    Sof(String),
    Sos(String),
    Jfif(String),
    Progressive(ProgressiveError),
}

impl Display for FormatInvalidReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSoi => write!(f, "stream does not start with SOI (0xFFD8)"),
            Self::MissingEoi => write!(f, "stream ended before EOI (0xFFD9)"),
            Self::InvalidMarker(b) => {
                write!(f, "byte 0xFF was followed by invalid marker 0x{b:02X}")
            }
            Self::Huffman(e) => write!(f, "Huffman table error: {e}"),
            Self::Quant(e) => write!(f, "quantization table error: {e}"),
            Self::Sof(reason) => write!(f, "start of frame error: {reason}"),
            Self::Sos(reason) => write!(f, "start of scan error: {reason}"),
            Self::Jfif(reason) => write!(f, "JFIF error: {reason}"),
            Self::Progressive(e) => write!(f, "progressive sequence error: {e}"),
        }
    }
}

/// §4.4 DHT failure taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HuffmanError {
    EmptyTable,
    InvalidTableClass,
    InvalidTableId,
    TruncatedLengths,
    TruncatedSymbols,
    DcSymbolOutOfRange,
    DuplicateSymbol,
    KraftInequalityViolation,
}

impl Display for HuffmanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::EmptyTable => "table has zero symbols",
            Self::InvalidTableClass => "table class must be 0 (DC) or 1 (AC)",
            Self::InvalidTableId => "table id must be in 0..4",
            Self::TruncatedLengths => "could not read the 16 BITS length counts",
            Self::TruncatedSymbols => "could not read all HUFFVAL symbols",
            Self::DcSymbolOutOfRange => "DC symbol category must be in 0..=11",
            Self::DuplicateSymbol => "duplicate symbol within a table",
            Self::KraftInequalityViolation => "BITS counts violate the Kraft inequality",
        };
        write!(f, "{msg}")
    }
}

/// §4.3 DQT failure taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuantError {
    ZeroValue,
    InvalidSlotId,
    InvalidPrecision,
    TruncatedValues,
}

impl Display for QuantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ZeroValue => "quantization table contains a zero entry",
            Self::InvalidSlotId => "quantization table slot id must be in 0..4",
            Self::InvalidPrecision => "quantization table precision must be 8 or 16 bit",
            Self::TruncatedValues => "could not read all 64 table entries",
        };
        write!(f, "{msg}")
    }
}

/// §4.8 progressive sequencing invariants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProgressiveError {
    DuplicateScan,
    BadSuccessiveApproximation,
    SpectralRangeInverted,
    TooManyScans,
    ComponentCountMismatch,
}

impl Display for ProgressiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::DuplicateScan => "duplicate progressive scan (Ss,Se,Ah,Al) tuple",
            Self::BadSuccessiveApproximation => {
                "successive approximation must refine by exactly one bit (Ah must equal previous Al)"
            }
            Self::SpectralRangeInverted => "spectral selection start is greater than end",
            Self::TooManyScans => "more than 64 scans processed for this frame",
            Self::ComponentCountMismatch => {
                "scan mixes components whose sampling factors disagree on interleave"
            }
        };
        write!(f, "{msg}")
    }
}

/// §4.1 and §4.7 truncation taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TruncatedReason {
    UnexpectedEndOfStream,
    LengthMismatch,
    BitStreamTruncated,
    ThumbnailByteShortage,
}

impl Display for TruncatedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::UnexpectedEndOfStream => "stream ended before the expected segment payload",
            Self::LengthMismatch => "segment length field exceeds the remaining buffer",
            Self::BitStreamTruncated => "entropy-coded data ended mid-codeword",
            Self::ThumbnailByteShortage => "JFIF thumbnail data shorter than width*height*3",
        };
        write!(f, "{msg}")
    }
}

/// §7 unsupported-feature taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnsupportedReason {
    ArithmeticCoding,
    Hierarchical,
    Lossless,
    Precision12Bit,
    SamplingFactorOutOfRange,
    TooManyComponents,
    TargetDimensionTooLarge,
}

impl Display for UnsupportedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ArithmeticCoding => "arithmetic-coded JPEG is not supported",
            Self::Hierarchical => "hierarchical JPEG is not supported",
            Self::Lossless => "lossless JPEG is not supported",
            Self::Precision12Bit => "12-bit-per-component JPEG is not supported",
            Self::SamplingFactorOutOfRange => "sampling factor must be in 1..=4",
            Self::TooManyComponents => "more than 4 components in a frame is not supported",
            Self::TargetDimensionTooLarge => "target dimension exceeds 32768",
        };
        write!(f, "{msg}")
    }
}

/// The crate-wide error type.
pub enum CodecError {
    InputInvalid(InputInvalidReason, Context),
    FormatInvalid(FormatInvalidReason, Context),
    Truncated(TruncatedReason, Context),
    Unsupported(UnsupportedReason, Context),
    /// An algorithmic invariant was violated. Never expected to fire; if it
    /// does, it's a bug in this crate, not bad input.
    Internal(&'static str),
}

impl CodecError {
    pub fn input_invalid(reason: InputInvalidReason) -> CodecError {
        CodecError::InputInvalid(reason, Context::none())
    }

    pub fn format_invalid(reason: FormatInvalidReason) -> CodecError {
        CodecError::FormatInvalid(reason, Context::none())
    }

    pub fn truncated(reason: TruncatedReason) -> CodecError {
        CodecError::Truncated(reason, Context::none())
    }

    pub fn unsupported(reason: UnsupportedReason) -> CodecError {
        CodecError::Unsupported(reason, Context::none())
    }

    /// Attach (or replace) context on an existing error, preserving the
    /// reason. Used by higher layers propagating a lower layer's error.
    #[must_use]
    pub fn with_context(self, context: Context) -> CodecError {
        match self {
            CodecError::InputInvalid(r, _) => CodecError::InputInvalid(r, context),
            CodecError::FormatInvalid(r, _) => CodecError::FormatInvalid(r, context),
            CodecError::Truncated(r, _) => CodecError::Truncated(r, context),
            CodecError::Unsupported(r, _) => CodecError::Unsupported(r, context),
            CodecError::Internal(r) => CodecError::Internal(r),
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputInvalid(reason, ctx) => {
                write!(f, "invalid input: {reason}")?;
                ctx.write_suffix(f)
            }
            Self::FormatInvalid(reason, ctx) => {
                write!(f, "invalid JPEG stream: {reason}")?;
                ctx.write_suffix(f)
            }
            Self::Truncated(reason, ctx) => {
                write!(f, "truncated input: {reason}")?;
                ctx.write_suffix(f)
            }
            Self::Unsupported(reason, ctx) => {
                write!(f, "unsupported: {reason}")?;
                ctx.write_suffix(f)
            }
            Self::Internal(reason) => write!(f, "internal invariant violated: {reason}"),
        }
    }
}

impl Debug for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(_: std::io::Error) -> CodecError {
        CodecError::truncated(TruncatedReason::UnexpectedEndOfStream)
    }
}

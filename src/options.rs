//! Typed configuration structs (spec.md §9), replacing the bag-of-setters
//! pattern with `Default`-backed builders the way the rest of this crate's
//! ambient stack favors explicit, validated config over mutable setters.
use crate::quant::{Precision, QualityScaling, RoundingMode};
use crate::resize::kernels::ResizeFilter;
use crate::rotate::FillColor;

/// Options controlling JPEG decode (spec.md §4, §4.8).
#[derive(Clone, Debug)]
pub struct DecoderOptions {
    /// Stop as soon as headers are parsed; skip entropy decode entirely.
    /// Used by callers that only want `width`/`height`/colorspace.
    pub headers_only: bool,
    /// Maximum `width * height` this decoder will allocate for.
    pub max_pixels: usize,
    /// Emit a log line per progressive scan as it completes.
    pub log_progressive_scans: bool,
}

impl Default for DecoderOptions {
    fn default() -> DecoderOptions {
        DecoderOptions {
            headers_only: false,
            max_pixels: crate::frame::MAX_PIXELS,
            log_progressive_scans: true,
        }
    }
}

/// Options controlling a resample operation (spec.md §4.9).
#[derive(Clone, Debug)]
pub struct ResizeOptions {
    pub filter: ResizeFilter,
    /// Upper bound on either output dimension; guards against a caller
    /// accidentally requesting a multi-gigabyte allocation.
    pub max_dimension: u32,
}

impl Default for ResizeOptions {
    fn default() -> ResizeOptions {
        ResizeOptions { filter: ResizeFilter::Bilinear, max_dimension: 32768 }
    }
}

/// Options controlling a rotate operation (spec.md §4.10).
#[derive(Clone, Debug)]
pub struct RotateOptions {
    pub filter: ResizeFilter,
    /// Color used for pixels the source image doesn't cover after an
    /// arbitrary-angle rotation.
    pub fill: FillColor,
}

impl Default for RotateOptions {
    fn default() -> RotateOptions {
        RotateOptions { filter: ResizeFilter::Bilinear, fill: FillColor::TRANSPARENT }
    }
}

/// Options controlling how a quantization table is derived from a quality
/// value (spec.md §4.6).
#[derive(Copy, Clone, Debug)]
pub struct QuantizationOptions {
    pub quality: i32,
    pub scaling: QualityScaling,
    pub rounding: RoundingMode,
    /// Sample precision a derived table's entries are clamped to; must match
    /// the precision a decoder expects to see in the `DQT` it writes.
    pub precision: Precision,
}

impl Default for QuantizationOptions {
    fn default() -> QuantizationOptions {
        QuantizationOptions {
            quality: 75,
            scaling: QualityScaling::Linear,
            rounding: RoundingMode::NearestAwayFromZero,
            precision: Precision::Eight,
        }
    }
}

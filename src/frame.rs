//! `SOF` frame descriptor (spec.md §3).
use log::info;

use crate::components::FrameComponent;
use crate::errors::{CodecError, Context, FormatInvalidReason, TruncatedReason, UnsupportedReason};
use crate::marker::Marker;

/// Maximum pixel count (`width * height`) this codec will allocate for, a
/// guard against hostile `SOF` headers claiming absurd dimensions.
pub const MAX_PIXELS: usize = 1 << 28;

/// Whether a frame uses baseline sequential, extended sequential, or
/// progressive coefficient ordering (the three `SOF` variants this codec
/// decodes; others are rejected as unsupported).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameMode {
    BaselineSequential,
    ExtendedSequential,
    Progressive,
}

/// A parsed `SOF0`/`SOF1`/`SOF2` header plus its component table.
#[derive(Clone, Debug)]
pub struct Frame {
    pub mode: FrameMode,
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<FrameComponent>,
}

impl Frame {
    /// Parse a `SOF` payload. `marker` identifies which `SOFn` variant this
    /// was, since the payload bytes themselves don't repeat it.
    pub fn parse(marker: Marker, payload: &[u8]) -> Result<Frame, CodecError> {
        let Marker::SOF(variant) = marker else {
            return Err(CodecError::Internal("Frame::parse called with a non-SOF marker"));
        };
        let mode = match variant {
            0 => FrameMode::BaselineSequential,
            1 => FrameMode::ExtendedSequential,
            2 => FrameMode::Progressive,
            3 => {
                return Err(CodecError::unsupported(UnsupportedReason::Lossless));
            }
            5..=7 | 13..=15 => {
                return Err(CodecError::unsupported(UnsupportedReason::Hierarchical));
            }
            9..=11 => {
                return Err(CodecError::unsupported(UnsupportedReason::ArithmeticCoding));
            }
            _ => {
                return Err(CodecError::format_invalid(FormatInvalidReason::Sof(format!(
                    "unrecognized SOF variant {variant}"
                ))))
            }
        };

        if payload.len() < 6 {
            return Err(CodecError::truncated(TruncatedReason::LengthMismatch));
        }
        let precision = payload[0];
        if precision == 12 {
            return Err(CodecError::unsupported(UnsupportedReason::Precision12Bit));
        }
        if precision != 8 {
            return Err(CodecError::format_invalid(FormatInvalidReason::Sof(format!(
                "unsupported sample precision {precision}, expected 8"
            ))));
        }

        let height = u16::from_be_bytes([payload[1], payload[2]]);
        let width = u16::from_be_bytes([payload[3], payload[4]]);
        if width == 0 || height == 0 {
            return Err(CodecError::format_invalid(FormatInvalidReason::Sof(
                "frame width or height is zero".to_string(),
            )));
        }
        let pixels = usize::from(width) * usize::from(height);
        if pixels > MAX_PIXELS {
            return Err(CodecError::unsupported(UnsupportedReason::TargetDimensionTooLarge)
                .with_context(Context::none().with_pixel(u32::from(width), u32::from(height))));
        }

        let num_components = payload[5] as usize;
        if num_components == 0 || num_components > 4 {
            return Err(CodecError::unsupported(UnsupportedReason::TooManyComponents));
        }
        let expected_len = 6 + 3 * num_components;
        if payload.len() != expected_len {
            return Err(CodecError::format_invalid(FormatInvalidReason::Sof(format!(
                "SOF length implies {num_components} components but payload is {} bytes",
                payload.len()
            ))));
        }

        let mut components = Vec::with_capacity(num_components);
        for i in 0..num_components {
            let off = 6 + i * 3;
            let bytes = [payload[off], payload[off + 1], payload[off + 2]];
            components.push(FrameComponent::parse(bytes)?);
        }

        info!("SOF{variant}: {width}x{height}, {num_components} component(s), mode={mode:?}");

        Ok(Frame { mode, precision, height, width, components })
    }

    /// The largest horizontal/vertical sampling factors across all
    /// components, used to derive the MCU grid (spec.md §3).
    pub fn max_sampling(&self) -> (u8, u8) {
        let max_h = self.components.iter().map(|c| c.horizontal_sample).max().unwrap_or(1);
        let max_v = self.components.iter().map(|c| c.vertical_sample).max().unwrap_or(1);
        (max_h, max_v)
    }

    /// MCU grid dimensions, rounding the image size up to a whole number of
    /// MCUs (spec.md §3).
    pub fn mcu_grid(&self) -> (usize, usize) {
        let (max_h, max_v) = self.max_sampling();
        let mcu_width = 8 * usize::from(max_h);
        let mcu_height = 8 * usize::from(max_v);
        let mcus_per_row = (usize::from(self.width) + mcu_width - 1) / mcu_width;
        let mcus_per_column = (usize::from(self.height) + mcu_height - 1) / mcu_height;
        (mcus_per_row, mcus_per_column)
    }

    /// Number of 8x8 blocks an MCU holds for `component`, spec.md §3.
    pub fn blocks_per_mcu(&self, component: &FrameComponent) -> usize {
        usize::from(component.horizontal_sample) * usize::from(component.vertical_sample)
    }

    /// `(blocks_per_line, blocks_per_column)` for `component`'s own block
    /// grid, padded out to whole MCUs the same way an interleaved scan
    /// would see it. Used by non-interleaved progressive AC scans, which
    /// walk a single component's blocks in raster order rather than MCU
    /// order (spec.md §4.8).
    pub fn component_block_grid(&self, component: &FrameComponent) -> (usize, usize) {
        let (mcus_per_row, mcus_per_column) = self.mcu_grid();
        (mcus_per_row * usize::from(component.horizontal_sample), mcus_per_column * usize::from(component.vertical_sample))
    }
}

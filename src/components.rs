//! Per-component records from a `SOF` header (spec.md §3, §4.3).
use log::info;

use crate::errors::{CodecError, Context, UnsupportedReason};

/// The component identifiers this codec recognizes by name. Anything else
/// (CMYK's `K`, or a nonstandard id) is still decoded, just reported as
/// `Other`.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum ComponentID {
    /// Luminance channel, conventionally id 1.
    Y,
    /// Blue-difference chrominance, conventionally id 2.
    Cb,
    /// Red-difference chrominance, conventionally id 3.
    Cr,
    /// Any other component id (e.g. CMYK's K, or a nonstandard frame).
    Other(u8),
}

impl ComponentID {
    fn from_id_byte(id: u8) -> ComponentID {
        match id {
            1 => ComponentID::Y,
            2 => ComponentID::Cb,
            3 => ComponentID::Cr,
            other => ComponentID::Other(other),
        }
    }
}

/// One component's record from a `SOF` frame header plus whatever a later
/// `SOS` fills in (Huffman table slots, DC predictor state).
#[derive(Clone, Debug)]
pub struct FrameComponent {
    pub id: u8,
    pub component_id: ComponentID,
    /// Horizontal sampling factor `Hi`, 1..=4.
    pub horizontal_sample: u8,
    /// Vertical sampling factor `Vi`, 1..=4.
    pub vertical_sample: u8,
    /// Quantization table slot this component's coefficients are scaled by.
    pub quantization_table_id: u8,
    /// DC Huffman table slot, assigned by the component's `SOS` entry.
    pub dc_huff_table: usize,
    /// AC Huffman table slot, assigned by the component's `SOS` entry.
    pub ac_huff_table: usize,
    /// Running DC predictor, reset to 0 at the start of each scan and at
    /// every restart marker (spec.md §4.7(c)).
    pub dc_pred: i32,
}

impl FrameComponent {
    /// Parse the 3-byte `SOF` component record: `(id, HV nibble, Tq)`.
    pub fn parse(bytes: [u8; 3]) -> Result<FrameComponent, CodecError> {
        let id = bytes[0];
        let horizontal_sample = bytes[1] >> 4;
        let vertical_sample = bytes[1] & 0x0F;
        let quantization_table_id = bytes[2];

        if !(1..=4).contains(&horizontal_sample) || !(1..=4).contains(&vertical_sample) {
            return Err(CodecError::unsupported(UnsupportedReason::SamplingFactorOutOfRange)
                .with_context(Context::none().with_table_id(id)));
        }

        let component_id = ComponentID::from_id_byte(id);
        info!(
            "component {component_id:?}: H={horizontal_sample} V={vertical_sample} quant_table={quantization_table_id}"
        );

        Ok(FrameComponent {
            id,
            component_id,
            horizontal_sample,
            vertical_sample,
            quantization_table_id,
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0,
        })
    }

    /// Whether this component is subsampled relative to `max_h`/`max_v`
    /// (the frame's largest sampling factors), spec.md §3.
    pub fn subsample_ratio(&self, max_h: u8, max_v: u8) -> SubSampRatio {
        match (self.horizontal_sample < max_h, self.vertical_sample < max_v) {
            (true, true) => SubSampRatio::Hv,
            (true, false) => SubSampRatio::H,
            (false, true) => SubSampRatio::V,
            (false, false) => SubSampRatio::None,
        }
    }
}

/// How a component is subsampled relative to the frame's densest component.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum SubSampRatio {
    Hv,
    H,
    V,
    None,
}

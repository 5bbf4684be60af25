//! RGBA rotation: lossless quadrant turns and arbitrary-angle resampled
//! rotation (spec.md §4.10).
pub mod arbitrary;
pub mod quadrant;

pub use arbitrary::rotate_arbitrary;
pub use quadrant::{rotate_180, rotate_270, rotate_90, Quadrant};

/// An RGBA fill color used for pixels an arbitrary-angle rotation leaves
/// uncovered by the source image (spec.md §4.10(d)).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FillColor(pub [u8; 4]);

impl FillColor {
    /// Fully transparent black, the default fill.
    pub const TRANSPARENT: FillColor = FillColor([0, 0, 0, 0]);

    /// Opaque black.
    pub const BLACK: FillColor = FillColor([0, 0, 0, 255]);

    pub fn rgba(self) -> [u8; 4] {
        self.0
    }
}

impl Default for FillColor {
    fn default() -> FillColor {
        FillColor::TRANSPARENT
    }
}

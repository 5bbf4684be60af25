//! The decoded/working pixel buffer (spec.md §1, §4.9, §4.10).
use crate::errors::{CodecError, InputInvalidReason};

/// An owned, row-major RGBA pixel buffer. `data.len()` is always exactly
/// `width * height * 4`; every constructor enforces this rather than
/// letting callers build an inconsistent buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaImage {
    /// Build a buffer from raw RGBA bytes, checking the length invariant.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage, CodecError> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(CodecError::input_invalid(InputInvalidReason::BufferLengthMismatch {
                expected,
                found: data.len(),
            }));
        }
        Ok(RgbaImage { width, height, data })
    }

    /// An all-zero (transparent black) buffer of the given dimensions.
    pub fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage { width, height, data: vec![0u8; (width as usize) * (height as usize) * 4] }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = self.pixel_offset(x, y);
        [self.data[offset], self.data[offset + 1], self.data[offset + 2], self.data[offset + 3]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let offset = self.pixel_offset(x, y);
        self.data[offset..offset + 4].copy_from_slice(&rgba);
    }

    #[inline]
    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize * 4;
        &self.data[start..start + self.width as usize * 4]
    }
}

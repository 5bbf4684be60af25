//! General-purpose RGBA resampling (spec.md §4.9).
pub mod kernels;
pub mod recommend;

use crate::errors::{CodecError, InputInvalidReason, UnsupportedReason};
use crate::image::RgbaImage;
use crate::options::ResizeOptions;
use kernels::resample_1d;

pub use kernels::ResizeFilter;
pub use recommend::{recommend_filter, ResizePriority};

/// Resize `src` to `(dst_width, dst_height)` using a separable two-pass
/// filter: horizontal pass first, then vertical, each channel treated
/// independently (spec.md §4.9(c)).
///
/// A zero target dimension or a dimension past
/// [`ResizeOptions::max_dimension`] is rejected rather than silently
/// clamped.
pub fn resize(
    src: &RgbaImage,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> Result<RgbaImage, CodecError> {
    if dst_width == 0 || dst_height == 0 {
        return Err(CodecError::input_invalid(InputInvalidReason::ZeroTargetDimension));
    }
    if dst_width > options.max_dimension || dst_height > options.max_dimension {
        return Err(CodecError::unsupported(UnsupportedReason::TargetDimensionTooLarge));
    }

    if src.width == dst_width && src.height == dst_height {
        return Ok(src.clone());
    }

    let src_w = src.width as usize;
    let src_h = src.height as usize;
    let dst_w = dst_width as usize;
    let dst_h = dst_height as usize;

    // Horizontal pass: resample each row in place, width src_w -> dst_w.
    let src_f: Vec<f32> = src.data.iter().map(|&b| b as f32).collect();
    let mut horiz = vec![0f32; dst_w * src_h * 4];
    for row in 0..src_h {
        let row_src = &src_f[row * src_w * 4..(row + 1) * src_w * 4];
        let row_dst = resample_1d(row_src, src_w, 4, dst_w, options.filter);
        horiz[row * dst_w * 4..(row + 1) * dst_w * 4].copy_from_slice(&row_dst);
    }

    // Vertical pass: resample each column, height src_h -> dst_h. Gather a
    // column into a contiguous buffer so resample_1d's stride-1 assumption
    // holds, then scatter the result back.
    let mut out = vec![0f32; dst_w * dst_h * 4];
    let mut column = vec![0f32; src_h * 4];
    for col in 0..dst_w {
        for row in 0..src_h {
            let src_off = (row * dst_w + col) * 4;
            column[row * 4..row * 4 + 4].copy_from_slice(&horiz[src_off..src_off + 4]);
        }
        let resampled = resample_1d(&column, src_h, 4, dst_h, options.filter);
        for row in 0..dst_h {
            let dst_off = (row * dst_w + col) * 4;
            out[dst_off..dst_off + 4].copy_from_slice(&resampled[row * 4..row * 4 + 4]);
        }
    }

    let data: Vec<u8> = out.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    RgbaImage::new(dst_width, dst_height, data)
}

/// Resize so the longer edge equals `max_edge`, preserving aspect ratio
/// (spec.md §4.9(e)). Returns the source unchanged if it already fits.
pub fn resize_to_fit(
    src: &RgbaImage,
    max_edge: u32,
    options: &ResizeOptions,
) -> Result<RgbaImage, CodecError> {
    if max_edge == 0 {
        return Err(CodecError::input_invalid(InputInvalidReason::ZeroTargetDimension));
    }
    if src.width <= max_edge && src.height <= max_edge {
        return Ok(src.clone());
    }
    let scale = max_edge as f64 / src.width.max(src.height) as f64;
    let dst_width = ((src.width as f64 * scale).round() as u32).max(1);
    let dst_height = ((src.height as f64 * scale).round() as u32).max(1);
    resize(src, dst_width, dst_height, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::blank(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                img.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        img
    }

    #[test]
    fn identity_resize_returns_equivalent_image() {
        let src = checkerboard(4, 4);
        let options = ResizeOptions::default();
        let out = resize(&src, 4, 4, &options).unwrap();
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn upsampling_preserves_dimensions_requested() {
        let src = checkerboard(4, 4);
        let options = ResizeOptions::default();
        let out = resize(&src, 8, 8, &options).unwrap();
        assert_eq!(out.width, 8);
        assert_eq!(out.height, 8);
    }

    #[test]
    fn rejects_zero_dimension() {
        let src = checkerboard(4, 4);
        let options = ResizeOptions::default();
        assert!(resize(&src, 0, 4, &options).is_err());
    }

    #[test]
    fn rejects_dimension_over_max() {
        let src = checkerboard(4, 4);
        let mut options = ResizeOptions::default();
        options.max_dimension = 10;
        assert!(resize(&src, 20, 20, &options).is_err());
    }

    #[test]
    fn resize_to_fit_preserves_aspect_ratio() {
        let src = checkerboard(100, 50);
        let options = ResizeOptions::default();
        let out = resize_to_fit(&src, 50, &options).unwrap();
        assert_eq!(out.width, 50);
        assert_eq!(out.height, 25);
    }

    #[test]
    fn resize_to_fit_is_noop_when_already_within_bound() {
        let src = checkerboard(10, 10);
        let options = ResizeOptions::default();
        let out = resize_to_fit(&src, 50, &options).unwrap();
        assert_eq!(out.width, 10);
        assert_eq!(out.height, 10);
    }
}

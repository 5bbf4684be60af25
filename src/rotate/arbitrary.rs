//! Arbitrary-angle rotation (spec.md §4.10(c)): inverse-map each output
//! pixel back into source space around the image center and resample.
use crate::errors::{CodecError, InputInvalidReason};
use crate::image::RgbaImage;
use crate::resize::kernels::sample_2d;
use crate::resize::ResizeFilter;

use super::FillColor;

/// Rotate `src` by `degrees` clockwise about its center.
///
/// The output canvas grows to bound the rotated rectangle exactly (the
/// same convention most image editors use), so corners are never
/// clipped. Pixels the source doesn't cover are painted `fill`.
pub fn rotate_arbitrary(
    src: &RgbaImage,
    degrees: f64,
    filter: ResizeFilter,
    fill: FillColor,
) -> Result<RgbaImage, CodecError> {
    if !degrees.is_finite() {
        return Err(CodecError::input_invalid(InputInvalidReason::NonFiniteAngle));
    }

    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin(), radians.cos());

    let (src_w, src_h) = (src.width as f64, src.height as f64);
    let corners = [
        rotate_point(0.0, 0.0, sin, cos),
        rotate_point(src_w, 0.0, sin, cos),
        rotate_point(0.0, src_h, sin, cos),
        rotate_point(src_w, src_h, sin, cos),
    ];
    let min_x = corners.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);

    let dst_w = ((max_x - min_x).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y).ceil() as u32).max(1);

    // Inverse rotation: map destination pixel centers back to source
    // space by rotating -radians around the source center.
    let inv_sin = -sin;
    let inv_cos = cos;
    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;

    let mut out = RgbaImage::blank(dst_w, dst_h);
    let fill_rgba = fill.rgba();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let px = dx as f64 + 0.5 - dst_w as f64 / 2.0;
            let py = dy as f64 + 0.5 - dst_h as f64 / 2.0;
            let sx = px * inv_cos - py * inv_sin + src_cx;
            let sy = px * inv_sin + py * inv_cos + src_cy;

            if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                out.set_pixel(dx, dy, fill_rgba);
            } else {
                let sample = sample_2d(&src.data, src.width as usize, src.height as usize, sx as f32, sy as f32, filter);
                out.set_pixel(dx, dy, sample);
            }
        }
    }

    Ok(out)
}

fn rotate_point(x: f64, y: f64, sin: f64, cos: f64) -> (f64, f64) {
    (x * cos - y * sin, x * sin + y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_degree_rotation_preserves_dimensions() {
        let src = RgbaImage::blank(4, 4);
        let out = rotate_arbitrary(&src, 0.0, ResizeFilter::Bilinear, FillColor::TRANSPARENT).unwrap();
        assert_eq!(out.width, 4);
        assert_eq!(out.height, 4);
    }

    #[test]
    fn rejects_non_finite_angle() {
        let src = RgbaImage::blank(2, 2);
        assert!(rotate_arbitrary(&src, f64::NAN, ResizeFilter::Bilinear, FillColor::TRANSPARENT).is_err());
    }

    #[test]
    fn forty_five_degree_rotation_grows_canvas() {
        let src = RgbaImage::blank(10, 10);
        let out = rotate_arbitrary(&src, 45.0, ResizeFilter::Bilinear, FillColor::TRANSPARENT).unwrap();
        assert!(out.width > 10);
        assert!(out.height > 10);
    }

    #[test]
    fn uncovered_corners_use_fill_color() {
        let mut src = RgbaImage::blank(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                src.set_pixel(x, y, [200, 200, 200, 255]);
            }
        }
        let out = rotate_arbitrary(&src, 45.0, ResizeFilter::Bilinear, FillColor::BLACK).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }
}

//! Lossless 90/180/270 degree rotation (spec.md §4.10(a)): each is an exact
//! pixel rearrangement, no resampling kernel involved.
use crate::image::RgbaImage;

/// A lossless quadrant turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Quadrant {
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Quadrant {
    /// Normalize an arbitrary degree value to the nearest quadrant, if it
    /// is within `1e-4` degrees of 90/180/270 (spec.md §4.10(e)); `None`
    /// otherwise, signaling the caller should fall back to arbitrary-angle
    /// rotation.
    pub fn from_angle(degrees: f64) -> Option<Quadrant> {
        let normalized = degrees.rem_euclid(360.0);
        const EPS: f64 = 1e-4;
        if (normalized - 90.0).abs() < EPS {
            Some(Quadrant::Rotate90)
        } else if (normalized - 180.0).abs() < EPS {
            Some(Quadrant::Rotate180)
        } else if (normalized - 270.0).abs() < EPS {
            Some(Quadrant::Rotate270)
        } else {
            None
        }
    }

    pub fn apply(self, src: &RgbaImage) -> RgbaImage {
        match self {
            Quadrant::Rotate90 => rotate_90(src),
            Quadrant::Rotate180 => rotate_180(src),
            Quadrant::Rotate270 => rotate_270(src),
        }
    }
}

/// Rotate 90 degrees clockwise: `dst[x, y] = src[y, width - 1 - x]`, width
/// and height swap.
pub fn rotate_90(src: &RgbaImage) -> RgbaImage {
    let (w, h) = (src.width as usize, src.height as usize);
    let mut out = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let src_off = (y * w + x) * 4;
            let dst_x = h - 1 - y;
            let dst_y = x;
            let dst_off = (dst_y * h + dst_x) * 4;
            out[dst_off..dst_off + 4].copy_from_slice(&src.data[src_off..src_off + 4]);
        }
    }
    RgbaImage { width: src.height, height: src.width, data: out }
}

/// Rotate 180 degrees: reverse row order, then reverse pixel order within
/// each row, mirroring the teacher's top/bottom swap approach but
/// generalized from single-sample rows to 4-byte RGBA pixels.
pub fn rotate_180(src: &RgbaImage) -> RgbaImage {
    let width = src.width as usize;
    let mut data = vec![0u8; src.data.len()];
    let rows: Vec<&[u8]> = src.data.chunks_exact(width * 4).collect();
    for (dst_row, src_row) in data.chunks_exact_mut(width * 4).zip(rows.iter().rev()) {
        for (dst_pixel, src_pixel) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4).rev()) {
            dst_pixel.copy_from_slice(src_pixel);
        }
    }
    RgbaImage { width: src.width, height: src.height, data }
}

/// Rotate 270 degrees clockwise (= 90 degrees counterclockwise):
/// `dst[x, y] = src[height - 1 - y, x]`, width and height swap.
pub fn rotate_270(src: &RgbaImage) -> RgbaImage {
    let (w, h) = (src.width as usize, src.height as usize);
    let mut out = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let src_off = (y * w + x) * 4;
            let dst_x = y;
            let dst_y = w - 1 - x;
            let dst_off = (dst_y * h + dst_x) * 4;
            out[dst_off..dst_off + 4].copy_from_slice(&src.data[src_off..src_off + 4]);
        }
    }
    RgbaImage { width: src.height, height: src.width, data: out }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::blank(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set_pixel(x, y, [(x * 10) as u8, (y * 10) as u8, 0, 255]);
            }
        }
        img
    }

    #[test]
    fn rotate_90_swaps_dimensions() {
        let src = gradient(3, 2);
        let out = rotate_90(&src);
        assert_eq!(out.width, 2);
        assert_eq!(out.height, 3);
    }

    #[test]
    fn rotate_90_then_270_is_identity() {
        let src = gradient(4, 3);
        let out = rotate_270(&rotate_90(&src));
        assert_eq!(out.width, src.width);
        assert_eq!(out.height, src.height);
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn rotate_180_twice_is_identity() {
        let src = gradient(4, 5);
        let out = rotate_180(&rotate_180(&src));
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn rotate_180_moves_corner_pixel() {
        let mut src = RgbaImage::blank(2, 2);
        src.set_pixel(0, 0, [9, 9, 9, 255]);
        let out = rotate_180(&src);
        assert_eq!(out.pixel(1, 1), [9, 9, 9, 255]);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn from_angle_recognizes_quadrants_within_tolerance() {
        assert_eq!(Quadrant::from_angle(90.00005), Some(Quadrant::Rotate90));
        assert_eq!(Quadrant::from_angle(180.0), Some(Quadrant::Rotate180));
        assert_eq!(Quadrant::from_angle(-90.0), Some(Quadrant::Rotate270));
        assert_eq!(Quadrant::from_angle(45.0), None);
    }
}

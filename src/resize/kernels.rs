//! Resampling kernels (spec.md §4.9(b)): nearest, bilinear, bicubic
//! (Catmull-Rom), and Lanczos, each as a `(distance) -> weight` function
//! fed into the same separable-filter driver.
use crate::util::{clamp_to_u8, sample_pixel};

/// Which resampling kernel a resize/rotate operation uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl ResizeFilter {
    /// Kernel support radius in source-pixel units (half the nonzero
    /// window width), spec.md §4.9(b).
    pub fn support(self) -> f32 {
        match self {
            ResizeFilter::Nearest => 0.5,
            ResizeFilter::Bilinear => 1.0,
            ResizeFilter::Bicubic => 2.0,
            ResizeFilter::Lanczos3 => 3.0,
        }
    }

    /// Evaluate the kernel's weight at `distance` (in source-pixel units
    /// from the sample center).
    pub fn weight(self, distance: f32) -> f32 {
        match self {
            ResizeFilter::Nearest => {
                if distance.abs() < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ResizeFilter::Bilinear => (1.0 - distance.abs()).max(0.0),
            ResizeFilter::Bicubic => catmull_rom(distance.abs()),
            ResizeFilter::Lanczos3 => lanczos(distance, 3.0),
        }
    }
}

/// Catmull-Rom cubic convolution, `a = -0.5` (the variant libjpeg-turbo and
/// most image libraries ship as their default "bicubic").
fn catmull_rom(x: f32) -> f32 {
    const A: f32 = -0.5;
    if x < 1.0 {
        (A + 2.0) * x.powi(3) - (A + 3.0) * x.powi(2) + 1.0
    } else if x < 2.0 {
        A * x.powi(3) - 5.0 * A * x.powi(2) + 8.0 * A * x - 4.0 * A
    } else {
        0.0
    }
}

fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-8 {
        1.0
    } else {
        let px = std::f32::consts::PI * x;
        px.sin() / px
    }
}

fn lanczos(x: f32, a: f32) -> f32 {
    if x.abs() < a {
        sinc(x) * sinc(x / a)
    } else {
        0.0
    }
}

/// One separable 1D resample pass over `src` (`len` samples, `channels`
/// interleaved per sample) into `dst` (`out_len` samples).
///
/// Shared by both resize axes and by arbitrary-angle rotation's per-axis
/// decomposition.
pub fn resample_1d(
    src: &[f32],
    len: usize,
    channels: usize,
    out_len: usize,
    filter: ResizeFilter,
) -> Vec<f32> {
    let mut dst = vec![0f32; out_len * channels];
    if len == 0 || out_len == 0 {
        return dst;
    }
    let scale = len as f32 / out_len as f32;
    // Widen the kernel support when downsampling so the filter still
    // covers enough source samples to avoid aliasing (standard practice
    // for separable image resampling).
    let filter_scale = scale.max(1.0);
    let support = filter.support() * filter_scale;

    for out_x in 0..out_len {
        // Half-pixel sampling convention: map the destination pixel's
        // center back into source space.
        let center = (out_x as f32 + 0.5) * scale - 0.5;
        let lo = (center - support).floor() as i64;
        let hi = (center + support).ceil() as i64;

        let mut weights_sum = 0f32;
        let mut acc = vec![0f32; channels];
        for sx in lo..=hi {
            let distance = (sx as f32 - center) / filter_scale;
            let w = filter.weight(distance);
            if w == 0.0 {
                continue;
            }
            let clamped = sx.clamp(0, len as i64 - 1) as usize;
            weights_sum += w;
            for c in 0..channels {
                acc[c] += w * src[clamped * channels + c];
            }
        }
        if weights_sum != 0.0 {
            for c in 0..channels {
                dst[out_x * channels + c] = acc[c] / weights_sum;
            }
        }
    }
    dst
}

/// Sample one arbitrary `(x, y)` source location with the given kernel,
/// used by arbitrary-angle rotation (spec.md §4.10(c)) which can't be
/// decomposed into two separable axis passes the way resize can.
pub fn sample_2d(
    data: &[u8],
    width: usize,
    height: usize,
    x: f32,
    y: f32,
    filter: ResizeFilter,
) -> [u8; 4] {
    let support = filter.support().ceil() as i64;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut acc = [0f32; 4];
    let mut weight_sum = 0f32;
    for dy in -support..=support {
        let sy = y0 + dy;
        let wy = filter.weight(sy as f32 - y);
        if wy == 0.0 {
            continue;
        }
        for dx in -support..=support {
            let sx = x0 + dx;
            let wx = filter.weight(sx as f32 - x);
            if wx == 0.0 {
                continue;
            }
            let w = wx * wy;
            let px = sample_pixel(data, width, height, sx, sy);
            weight_sum += w;
            for c in 0..4 {
                acc[c] += w * px[c];
            }
        }
    }
    if weight_sum == 0.0 {
        return [0, 0, 0, 0];
    }
    [
        clamp_to_u8(acc[0] / weight_sum),
        clamp_to_u8(acc[1] / weight_sum),
        clamp_to_u8(acc[2] / weight_sum),
        clamp_to_u8(acc[3] / weight_sum),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_weight_is_tent_shaped() {
        assert_eq!(ResizeFilter::Bilinear.weight(0.0), 1.0);
        assert_eq!(ResizeFilter::Bilinear.weight(1.0), 0.0);
        assert!((ResizeFilter::Bilinear.weight(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn nearest_weight_is_a_step() {
        assert_eq!(ResizeFilter::Nearest.weight(0.0), 1.0);
        assert_eq!(ResizeFilter::Nearest.weight(0.6), 0.0);
    }

    #[test]
    fn lanczos_weight_is_one_at_origin() {
        assert!((ResizeFilter::Lanczos3.weight(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn resample_1d_upsamples_constant_signal_to_constant() {
        let src = vec![1.0f32, 1.0, 1.0, 1.0];
        let out = resample_1d(&src, 4, 1, 8, ResizeFilter::Bilinear);
        assert!(out.iter().all(|&v| (v - 1.0).abs() < 1e-4));
    }

    #[test]
    fn resample_1d_identity_preserves_values() {
        let src = vec![10.0f32, 20.0, 30.0];
        let out = resample_1d(&src, 3, 1, 3, ResizeFilter::Nearest);
        assert_eq!(out, src);
    }
}

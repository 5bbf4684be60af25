//! Resample algorithm recommendation oracle (spec.md §4.9(f)): given the
//! source/target dimensions and a caller priority, suggest the filter that
//! best balances quality and cost rather than forcing every caller to pick
//! one by hand.
use super::kernels::ResizeFilter;

/// What the caller cares most about when resampling; tunes which filter
/// [`recommend_filter`] picks once the change is more than minimal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResizePriority {
    Speed,
    Quality,
    Balanced,
}

/// A change this small (within 2% linear scale) is treated as effectively
/// no-op; resampling it with anything beyond `Nearest` buys nothing visible.
const MINIMAL_CHANGE_TOLERANCE: f64 = 0.02;

/// Below this scale a reduction counts as "strong" (`Balanced` prefers
/// `Lanczos3`); above this scale an enlargement counts as "large"
/// (`Balanced` prefers `Bicubic`).
const STRONG_DOWNSCALE: f64 = 0.5;
const LARGE_UPSCALE: f64 = 2.0;

/// Recommend a filter for resampling `(src_w, src_h)` to `(dst_w, dst_h)`
/// under the given `priority`, spec.md §4.9(f):
///
/// - Minimal change (within [`MINIMAL_CHANGE_TOLERANCE`]) always recommends
///   [`ResizeFilter::Nearest`], regardless of priority.
/// - `Speed`: [`ResizeFilter::Nearest`] when shrinking,
///   [`ResizeFilter::Bilinear`] when enlarging.
/// - `Quality`: [`ResizeFilter::Lanczos3`] when shrinking,
///   [`ResizeFilter::Bicubic`] when enlarging.
/// - `Balanced`: [`ResizeFilter::Bilinear`] for a small change in either
///   direction, [`ResizeFilter::Bicubic`] for a large upscale, and
///   [`ResizeFilter::Lanczos3`] for a strong downscale.
pub fn recommend_filter(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, priority: ResizePriority) -> ResizeFilter {
    let scale_x = f64::from(dst_w) / f64::from(src_w.max(1));
    let scale_y = f64::from(dst_h) / f64::from(src_h.max(1));
    // The axis closer to 1.0 dominates "how minimal is this change"; the
    // axis furthest from 1.0 dominates "how strong is this resize".
    let scale = (scale_x * scale_y).sqrt();

    if (scale - 1.0).abs() <= MINIMAL_CHANGE_TOLERANCE {
        return ResizeFilter::Nearest;
    }

    match priority {
        ResizePriority::Speed => {
            if scale < 1.0 {
                ResizeFilter::Nearest
            } else {
                ResizeFilter::Bilinear
            }
        }
        ResizePriority::Quality => {
            if scale < 1.0 {
                ResizeFilter::Lanczos3
            } else {
                ResizeFilter::Bicubic
            }
        }
        ResizePriority::Balanced => {
            if scale <= STRONG_DOWNSCALE {
                ResizeFilter::Lanczos3
            } else if scale >= LARGE_UPSCALE {
                ResizeFilter::Bicubic
            } else {
                ResizeFilter::Bilinear
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_dimensions_recommend_nearest() {
        assert_eq!(recommend_filter(100, 100, 100, 100, ResizePriority::Balanced), ResizeFilter::Nearest);
    }

    #[test]
    fn minimal_change_recommends_nearest_regardless_of_priority() {
        assert_eq!(recommend_filter(100, 100, 101, 101, ResizePriority::Balanced), ResizeFilter::Nearest);
        assert_eq!(recommend_filter(100, 100, 101, 101, ResizePriority::Quality), ResizeFilter::Nearest);
        assert_eq!(recommend_filter(100, 100, 101, 101, ResizePriority::Speed), ResizeFilter::Nearest);
    }

    #[test]
    fn quality_downscale_recommends_lanczos() {
        assert_eq!(recommend_filter(200, 200, 50, 50, ResizePriority::Quality), ResizeFilter::Lanczos3);
    }

    #[test]
    fn speed_upscale_recommends_bilinear() {
        assert_eq!(recommend_filter(100, 100, 300, 300, ResizePriority::Speed), ResizeFilter::Bilinear);
    }

    #[test]
    fn speed_downscale_recommends_nearest() {
        assert_eq!(recommend_filter(300, 300, 100, 100, ResizePriority::Speed), ResizeFilter::Nearest);
    }

    #[test]
    fn quality_upscale_recommends_bicubic() {
        assert_eq!(recommend_filter(100, 100, 300, 300, ResizePriority::Quality), ResizeFilter::Bicubic);
    }

    #[test]
    fn balanced_strong_downscale_recommends_lanczos() {
        assert_eq!(recommend_filter(1000, 1000, 400, 400, ResizePriority::Balanced), ResizeFilter::Lanczos3);
    }

    #[test]
    fn balanced_large_upscale_recommends_bicubic() {
        assert_eq!(recommend_filter(100, 100, 250, 250, ResizePriority::Balanced), ResizeFilter::Bicubic);
    }

    #[test]
    fn balanced_mild_change_recommends_bilinear() {
        assert_eq!(recommend_filter(100, 100, 140, 140, ResizePriority::Balanced), ResizeFilter::Bilinear);
    }
}

//! Per-pixel enhancement filters on RGBA buffers.
//!
//! ## Filter Order
//! 1. Contrast / exposure (when enhancement is enabled)
//! 2. Unsharp sharpen (when sharpening is enabled)
//!
//! Both stages operate on the same buffer. Alpha is never modified.

use crate::settings::Settings;

/// Round and clamp a channel value into `0..=255`.
#[inline]
pub fn clamp8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Apply contrast and exposure to RGBA pixel data in place.
///
/// Contrast is a multiplier around mid-gray (clamped to 0.1-3.0); exposure
/// is an offset in percent of full scale (clamped to -100..100).
///
/// Formula: `out = clamp8((c - 128) * contrast + 128 + offset)`
pub fn apply_contrast_exposure(pixels: &mut [u8], contrast: f32, exposure: f32) {
    let contrast = if contrast.is_finite() {
        contrast.clamp(0.1, 3.0)
    } else {
        1.0
    };
    let offset = if exposure.is_finite() {
        (exposure * 2.55).round().clamp(-255.0, 255.0)
    } else {
        0.0
    };

    // Identity leaves the buffer untouched
    if contrast == 1.0 && offset == 0.0 {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        for c in &mut chunk[..3] {
            *c = clamp8((*c as f32 - 128.0) * contrast + 128.0 + offset);
        }
    }
}

/// Sharpen RGBA pixel data in place with a 4-neighbour unsharp kernel.
///
/// Every interior pixel becomes `center * (1 + 4k) - (up + down + left + right) * k`,
/// read from an unmodified copy of the input. Border pixels and alpha are
/// left as they were. Images narrower or shorter than 3 pixels have no
/// interior and are returned unchanged.
pub fn unsharp_mask(pixels: &mut [u8], width: u32, height: u32, amount: f32) {
    if !amount.is_finite() || amount <= 0.0 {
        return;
    }
    let (w, h) = (width as usize, height as usize);
    if w < 3 || h < 3 || pixels.len() < w * h * 4 {
        return;
    }

    let source = pixels.to_vec();
    let stride = w * 4;
    let center_weight = 1.0 + 4.0 * amount;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * stride + x * 4;
            for c in 0..3 {
                let i = idx + c;
                let neighbours = source[i - stride] as f32
                    + source[i + stride] as f32
                    + source[i - 4] as f32
                    + source[i + 4] as f32;
                pixels[i] = clamp8(source[i] as f32 * center_weight - neighbours * amount);
            }
        }
    }
}

/// Run the enabled filter stages from `settings` over an RGBA buffer.
pub fn apply_filters(pixels: &mut [u8], width: u32, height: u32, settings: &Settings) {
    if settings.enhance.enabled {
        apply_contrast_exposure(pixels, settings.enhance.contrast, settings.enhance.exposure);
    }
    if settings.sharpen.enabled {
        unsharp_mask(pixels, width, height, settings.sharpen.amount);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rgba_buffer(max_pixels: usize) -> impl Strategy<Value = Vec<u8>> {
        (1..=max_pixels).prop_flat_map(|n| prop::collection::vec(any::<u8>(), n * 4))
    }

    proptest! {
        /// Property: alpha is never touched by contrast / exposure.
        #[test]
        fn prop_contrast_preserves_alpha(
            pixels in rgba_buffer(64),
            contrast in -1.0f32..5.0,
            exposure in -150.0f32..150.0,
        ) {
            let mut out = pixels.clone();
            apply_contrast_exposure(&mut out, contrast, exposure);
            for (a, b) in pixels.chunks_exact(4).zip(out.chunks_exact(4)) {
                prop_assert_eq!(a[3], b[3]);
            }
        }

        /// Property: sharpening leaves the border ring and alpha unchanged.
        #[test]
        fn prop_sharpen_preserves_border(
            (w, h, pixels) in (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), prop::collection::vec(any::<u8>(), (w * h * 4) as usize))
            }),
            amount in 0.0f32..3.0,
        ) {
            let mut out = pixels.clone();
            unsharp_mask(&mut out, w, h, amount);
            for y in 0..h as usize {
                for x in 0..w as usize {
                    let idx = (y * w as usize + x) * 4;
                    prop_assert_eq!(out[idx + 3], pixels[idx + 3]);
                    let border = x == 0 || y == 0 || x + 1 == w as usize || y + 1 == h as usize;
                    if border {
                        prop_assert_eq!(&out[idx..idx + 4], &pixels[idx..idx + 4]);
                    }
                }
            }
        }
    }
}

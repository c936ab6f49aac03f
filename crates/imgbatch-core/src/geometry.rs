//! Crop rectangle and output size resolution.
//!
//! Given the source dimensions, an optional manual crop, a focal point and
//! the settings, [`resolve_geometry`] decides which source pixels are used
//! and how large the output surface is, before any pixel is touched.
//!
//! # Crop priority
//!
//! 1. A manual crop, clipped to the source bounds
//! 2. Automatic crop to an aspect ratio around the focal point
//! 3. The full source
//!
//! Every resolved dimension is at least one pixel, and neither the output
//! nor its rotated canvas may exceed [`MAX_OUTPUT_PIXELS`].

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::settings::{CropSettings, GeometrySettings, ResizeMode, ResizeSettings, Settings};
use crate::transform::compute_rotated_bounds;

/// Largest surface the pipeline allocates, in pixels (400 MB of RGBA).
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// A crop rectangle in source pixels, as saved by the user.
///
/// Signed because an interactive crop box can be dragged past the image
/// edges; it is clipped during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle fully inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Focal point in percent of the source size (0 to 100 on each axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Focal {
    pub x: f64,
    pub y: f64,
}

impl Default for Focal {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

impl Focal {
    /// Build a focal point, clamping each axis into 0-100.
    pub fn new(x: f64, y: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 50.0 };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }
}

/// Resolved source rectangle and output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub source: PixelRect,
    pub target_width: u32,
    pub target_height: u32,
}

#[inline]
fn round_px(v: f64) -> u32 {
    v.round().max(1.0) as u32
}

/// Resolve crop rectangle and output size for one image.
///
/// # Errors
///
/// `InvalidCropRequest` when the manual crop has no area inside the source,
/// `InvalidResizeRequest` when the output or its rotated canvas is larger
/// than [`MAX_OUTPUT_PIXELS`].
pub fn resolve_geometry(
    source_width: u32,
    source_height: u32,
    manual_crop: Option<&CropRect>,
    focal: Focal,
    settings: &Settings,
) -> Result<Geometry, ConvertError> {
    let source = resolve_source_rect(source_width, source_height, manual_crop, focal, &settings.crop)?;
    let (target_width, target_height) = resolve_target_size(&source, &settings.resize)?;
    check_output_size(target_width, target_height, &settings.geometry)?;
    Ok(Geometry {
        source,
        target_width,
        target_height,
    })
}

/// Reject outputs whose surface, before or after rotation, is too large to
/// allocate.
pub fn check_output_size(
    width: u32,
    height: u32,
    geometry: &GeometrySettings,
) -> Result<(), ConvertError> {
    let (rotated_w, rotated_h) =
        compute_rotated_bounds(width, height, geometry.wrapped_rotation() as f64);
    for (w, h) in [(width, height), (rotated_w, rotated_h)] {
        if w as u64 * h as u64 > MAX_OUTPUT_PIXELS {
            return Err(ConvertError::InvalidResizeRequest {
                width: w,
                height: h,
            });
        }
    }
    Ok(())
}

/// Pick the source rectangle.
pub fn resolve_source_rect(
    source_width: u32,
    source_height: u32,
    manual_crop: Option<&CropRect>,
    focal: Focal,
    crop: &CropSettings,
) -> Result<PixelRect, ConvertError> {
    if let Some(rect) = manual_crop {
        return clip_manual_crop(rect, source_width, source_height);
    }
    if !crop.enabled || source_width == 0 || source_height == 0 {
        return Ok(PixelRect::full(source_width.max(1), source_height.max(1)));
    }

    let ratio = effective_ratio(crop, source_width, source_height);
    Ok(auto_crop(source_width, source_height, ratio, focal))
}

fn clip_manual_crop(rect: &CropRect, width: u32, height: u32) -> Result<PixelRect, ConvertError> {
    let invalid = || ConvertError::InvalidCropRequest {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        source_width: width,
        source_height: height,
    };
    if rect.width <= 0 || rect.height <= 0 {
        return Err(invalid());
    }

    let left = rect.x.max(0);
    let top = rect.y.max(0);
    let right = rect.x.saturating_add(rect.width).min(width as i64);
    let bottom = rect.y.saturating_add(rect.height).min(height as i64);
    if right <= left || bottom <= top {
        return Err(invalid());
    }

    Ok(PixelRect {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Width / height ratio used by the automatic crop.
///
/// An explicit preset ratio wins over the named aspect; a missing or
/// unusable ratio falls back to the source's own aspect.
pub fn effective_ratio(crop: &CropSettings, source_width: u32, source_height: u32) -> f64 {
    let source_ratio = source_width as f64 / source_height as f64;
    match crop.preset_ratio {
        Some(r) if r.is_finite() && r > 0.0 => r,
        Some(r) => {
            warn!("Ignoring crop ratio {r}, it must be a positive number");
            crop.aspect.ratio().unwrap_or(source_ratio)
        }
        None => crop.aspect.ratio().unwrap_or(source_ratio),
    }
}

/// Largest rectangle of `ratio` inside the source, centered on the focal
/// point and shifted back inside the bounds.
pub fn auto_crop(width: u32, height: u32, ratio: f64, focal: Focal) -> PixelRect {
    let (w, h) = (width as f64, height as f64);

    let (crop_w, crop_h) = if w / h > ratio {
        (round_px(h * ratio).min(width), height)
    } else {
        (width, round_px(w / ratio).min(height))
    };

    let x = (focal.x / 100.0 * w - crop_w as f64 / 2.0).round();
    let y = (focal.y / 100.0 * h - crop_h as f64 / 2.0).round();

    PixelRect {
        x: x.clamp(0.0, (width - crop_w) as f64) as u32,
        y: y.clamp(0.0, (height - crop_h) as f64) as u32,
        width: crop_w,
        height: crop_h,
    }
}

/// Output size for a resolved source rectangle.
///
/// A fixed-pixel box with a zero side has not been filled in yet and leaves
/// the crop size unchanged.
pub fn resolve_target_size(
    source: &PixelRect,
    resize: &ResizeSettings,
) -> Result<(u32, u32), ConvertError> {
    let (sw, sh) = (source.width as f64, source.height as f64);

    match resize.mode {
        ResizeMode::Original => Ok((source.width.max(1), source.height.max(1))),
        ResizeMode::FixedPixels => {
            let (bw, bh) = (resize.width, resize.height);
            if bw == 0 || bh == 0 {
                return Ok((source.width.max(1), source.height.max(1)));
            }
            if !resize.keep_aspect {
                return Ok((bw, bh));
            }
            let ratio = sw / sh;
            if bw as f64 / bh as f64 > ratio {
                Ok((round_px(bh as f64 * ratio), bh))
            } else {
                Ok((bw, round_px(bw as f64 / ratio)))
            }
        }
        ResizeMode::Percent => {
            let percent = if resize.percent.is_finite() {
                resize.percent
            } else {
                warn!("Ignoring resize percent {}, using 100", resize.percent);
                100.0
            };
            let factor = percent.clamp(1.0, 1000.0) / 100.0;
            Ok((round_px(sw * factor), round_px(sh * factor)))
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::settings::AspectMode;
    use proptest::prelude::*;

    fn aspect_strategy() -> impl Strategy<Value = AspectMode> {
        prop_oneof![
            Just(AspectMode::Free),
            Just(AspectMode::Square),
            Just(AspectMode::Standard),
            Just(AspectMode::Widescreen),
            Just(AspectMode::Portrait),
        ]
    }

    fn mode_strategy() -> impl Strategy<Value = ResizeMode> {
        prop_oneof![
            Just(ResizeMode::Original),
            Just(ResizeMode::FixedPixels),
            Just(ResizeMode::Percent),
        ]
    }

    proptest! {
        /// Property: output dimensions are always at least one pixel.
        #[test]
        fn prop_target_at_least_one(
            (width, height) in (1u32..=1000, 1u32..=1000),
            aspect in aspect_strategy(),
            enabled in any::<bool>(),
            mode in mode_strategy(),
            (box_w, box_h) in (1u32..=3000, 1u32..=3000),
            percent in -50.0f64..2000.0,
            keep_aspect in any::<bool>(),
            (fx, fy) in (0.0f64..=100.0, 0.0f64..=100.0),
        ) {
            let mut settings = Settings::new();
            settings.crop.enabled = enabled;
            settings.crop.aspect = aspect;
            settings.resize.mode = mode;
            settings.resize.width = box_w;
            settings.resize.height = box_h;
            settings.resize.percent = percent;
            settings.resize.keep_aspect = keep_aspect;

            let g = resolve_geometry(width, height, None, Focal::new(fx, fy), &settings).unwrap();
            prop_assert!(g.target_width >= 1);
            prop_assert!(g.target_height >= 1);
        }

        /// Property: the automatic crop always lies inside the source.
        #[test]
        fn prop_auto_crop_inside_source(
            (width, height) in (1u32..=4000, 1u32..=4000),
            ratio in 0.05f64..20.0,
            (fx, fy) in (0.0f64..=100.0, 0.0f64..=100.0),
        ) {
            let rect = auto_crop(width, height, ratio, Focal::new(fx, fy));
            prop_assert!(rect.width >= 1 && rect.height >= 1);
            prop_assert!(rect.x + rect.width <= width);
            prop_assert!(rect.y + rect.height <= height);
            // One side always spans the full source
            prop_assert!(rect.width == width || rect.height == height);
        }

        /// Property: clipped manual crops stay inside the source.
        #[test]
        fn prop_manual_crop_inside_source(
            (width, height) in (1u32..=500, 1u32..=500),
            (x, y) in (-600i64..600, -600i64..600),
            (w, h) in (1i64..800, 1i64..800),
        ) {
            let crop = CropRect::new(x, y, w, h);
            if let Ok(rect) = resolve_source_rect(width, height, Some(&crop), Focal::default(), &CropSettings::default()) {
                prop_assert!(rect.width >= 1 && rect.height >= 1);
                prop_assert!(rect.x + rect.width <= width);
                prop_assert!(rect.y + rect.height <= height);
            }
        }

        /// Property: keep-aspect output fits inside the requested box.
        #[test]
        fn prop_keep_aspect_fits_box(
            (width, height) in (1u32..=2000, 1u32..=2000),
            (box_w, box_h) in (1u32..=2000, 1u32..=2000),
        ) {
            let mut resize = ResizeSettings::default();
            resize.mode = ResizeMode::FixedPixels;
            resize.width = box_w;
            resize.height = box_h;
            let (tw, th) = resolve_target_size(&PixelRect::full(width, height), &resize).unwrap();
            prop_assert!(tw <= box_w.max(1) && th <= box_h.max(1));
            prop_assert!(tw == box_w || th == box_h);
        }
    }
}

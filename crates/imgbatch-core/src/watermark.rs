//! Text and logo watermarks.
//!
//! Both overlays are positioned with [`place`]: the returned point is the
//! element's left edge and its *bottom* edge (the text baseline), so callers
//! drawing from the top subtract the element height.
//!
//! Text is rasterized with the font in [`TextWatermark::font`], or with the
//! bundled DejaVu Sans when none is set.

use ab_glyph::{Font, FontArc, InvalidFont, PxScale, ScaleFont};
use image::{imageops, GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::morphology::{grayscale_dilate, Mask};
use lazy_static::lazy_static;
use log::{debug, warn};

use crate::decode::{DecodedImage, FilterType};
use crate::geometry::MAX_OUTPUT_PIXELS;
use crate::settings::{Anchor, LogoWatermark, TextWatermark};
use crate::transform::Surface;

/// Largest font size rasterized, in pixels.
pub const MAX_FONT_SIZE: f32 = 2048.0;

lazy_static! {
    static ref DEFAULT_FONT: Option<FontArc> =
        FontArc::try_from_slice(include_bytes!("../assets/DejaVuSans.ttf")).ok();
}

/// The bundled DejaVu Sans face.
pub fn default_font() -> Option<&'static FontArc> {
    DEFAULT_FONT.as_ref()
}

/// Anchor an element of size `w` x `h` on a `cw` x `ch` canvas.
///
/// Returns `(x, y)` where `x` is the left edge and `y` the bottom edge.
/// Negative margins are treated as zero.
pub fn place(anchor: Anchor, w: f32, h: f32, cw: f32, ch: f32, margin: f32) -> (f32, f32) {
    let m = margin.max(0.0);
    match anchor {
        Anchor::TopLeft => (m, m + h),
        Anchor::TopRight => (cw - m - w, m + h),
        Anchor::BottomLeft => (m, ch - m),
        Anchor::Center => ((cw - w) / 2.0, (ch + h) / 2.0),
        Anchor::BottomRight => (cw - m - w, ch - m),
    }
}

/// Load a TrueType / OpenType font from owned bytes.
pub fn load_font(bytes: Vec<u8>) -> Result<FontArc, InvalidFont> {
    FontArc::try_from_vec(bytes)
}

/// Rendered width of `text` in pixels, from glyph advances and kerning.
pub fn measure_text(font: &FontArc, size: f32, text: &str) -> f32 {
    text_size(PxScale::from(size), font, text).0 as f32
}

/// Outline width for a given font size, at least one pixel.
#[inline]
pub fn stroke_width(font_size: f32) -> f32 {
    (font_size / 10.0).round().max(1.0)
}

/// Draw the text watermark: black outline, then white fill.
///
/// Returns `false` when there is nothing to draw: blank text, a
/// non-positive size or text placed entirely off the canvas.
pub fn draw_text_watermark(surface: &mut Surface, watermark: &TextWatermark) -> bool {
    let text = watermark.text.as_str();
    if text.trim().is_empty() {
        return false;
    }
    let Some(font) = watermark.font.as_ref().or(default_font()) else {
        warn!("Skipping text watermark, bundled font failed to load");
        return false;
    };
    let mut size = watermark.font_size;
    if !size.is_finite() || size <= 0.0 {
        warn!("Skipping text watermark with font size {size}");
        return false;
    }
    if size > MAX_FONT_SIZE {
        warn!("Clamping font size {size} to {MAX_FONT_SIZE}");
        size = MAX_FONT_SIZE;
    }

    let (cw, ch) = (surface.width() as i64, surface.height() as i64);
    let scale = PxScale::from(size);
    let (w, h) = text_size(scale, font, text);
    let (x, baseline) = place(watermark.anchor, w as f32, size, cw as f32, ch as f32, watermark.margin);

    // imageproc positions text by its top edge
    let top = baseline - font.as_scaled(scale).ascent();
    let (x, y) = (x.round() as i64, top.round() as i64);

    // Rasterize into a mask around the text only, clipped to the canvas plus
    // the outline reach. Glyphs may overhang their advance box.
    let radius = (stroke_width(size) / 2.0).round().clamp(1.0, u8::MAX as f32) as i64;
    let pad = radius + 2 + (size / 4.0).ceil() as i64;
    let left = (x - pad).max(-radius);
    let right = (x + w as i64 + pad).min(cw + radius);
    let upper = (y - pad).max(-radius);
    let lower = (y + h as i64 + pad).min(ch + radius);
    let visible = cw > 0 && ch > 0 && right > 0 && lower > 0 && left < cw && upper < ch;
    if !visible {
        debug!("text watermark '{text}' falls outside the canvas");
        return false;
    }

    let mut fill = GrayImage::new((right - left) as u32, (lower - upper) as u32);
    draw_text_mut(&mut fill, Luma([255]), (x - left) as i32, (y - upper) as i32, scale, font, text);
    let stroke = grayscale_dilate(&fill, &Mask::disk(radius as u8));

    let opacity = sanitize_opacity(watermark.opacity);
    surface.blend_mask(&stroke, left, upper, [0, 0, 0], opacity);
    surface.blend_mask(&fill, left, upper, [255, 255, 255], opacity);
    debug!("drew text watermark '{text}' at ({x}, {y}) size {size}");
    true
}

/// Logo size on a canvas `canvas_width` wide: `scale` percent of the
/// canvas width, height from the logo's aspect ratio.
///
/// `None` when the logo scales below one pixel or above
/// [`MAX_OUTPUT_PIXELS`].
pub fn logo_size(logo: &DecodedImage, canvas_width: u32, scale: f32) -> Option<(u32, u32)> {
    if logo.is_empty() || !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let width = (canvas_width as f32 * scale / 100.0).round();
    if width < 1.0 {
        return None;
    }
    let height = (width as f64 / logo.aspect_ratio()).round().max(1.0);
    if width as f64 * height > MAX_OUTPUT_PIXELS as f64 {
        warn!("Skipping {width}x{height} logo, too large to allocate");
        return None;
    }
    Some((width as u32, height as u32))
}

/// Draw the logo watermark, resampled with `filter`.
///
/// Returns `false` when no logo is loaded or it scales to nothing.
pub fn draw_logo(surface: &mut Surface, watermark: &LogoWatermark, filter: FilterType) -> bool {
    let Some(logo) = watermark.image.as_ref() else {
        return false;
    };
    let Some((w, h)) = logo_size(logo, surface.width(), watermark.scale) else {
        debug!("logo scales to nothing on a {}px canvas", surface.width());
        return false;
    };
    let Some(view) = logo.as_view() else {
        warn!("Skipping logo, pixel buffer does not match {}x{}", logo.width, logo.height);
        return false;
    };

    let scaled = imageops::resize(&view, w, h, filter.to_image_filter());
    let (x, y) = place(
        watermark.anchor,
        w as f32,
        h as f32,
        surface.width() as f32,
        surface.height() as f32,
        watermark.margin,
    );
    let (left, top) = (x.round() as i64, (y - h as f32).round() as i64);
    surface.draw_at(&scaled, left, top, sanitize_opacity(watermark.opacity));
    debug!("drew {w}x{h} logo at ({left}, {top})");
    true
}

#[inline]
fn sanitize_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;

    #[test]
    fn test_place_bottom_right() {
        assert_eq!(place(Anchor::BottomRight, 40.0, 20.0, 200.0, 100.0, 10.0), (150.0, 90.0));
    }

    #[test]
    fn test_place_all_anchors() {
        let at = |anchor| place(anchor, 40.0, 20.0, 200.0, 100.0, 10.0);
        assert_eq!(at(Anchor::TopLeft), (10.0, 30.0));
        assert_eq!(at(Anchor::TopRight), (150.0, 30.0));
        assert_eq!(at(Anchor::BottomLeft), (10.0, 90.0));
        assert_eq!(at(Anchor::Center), (80.0, 60.0));
    }

    #[test]
    fn test_place_negative_margin_is_zero() {
        assert_eq!(place(Anchor::TopLeft, 40.0, 20.0, 200.0, 100.0, -5.0), (0.0, 20.0));
    }

    #[test]
    fn test_stroke_width() {
        assert_eq!(stroke_width(24.0), 2.0);
        assert_eq!(stroke_width(4.0), 1.0);
        assert_eq!(stroke_width(100.0), 10.0);
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        assert!(load_font(vec![1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let mut surface = Surface::new(10, 10);
        let mut wm = TextWatermark::default();
        wm.text = "   ".into();
        assert!(!draw_text_watermark(&mut surface, &wm));
    }

    #[test]
    fn test_bundled_font_loads() {
        let font = default_font().expect("bundled font");
        assert!(measure_text(font, 24.0, "Hi") > 0.0);
    }

    fn gray_canvas() -> Surface {
        Surface::with_background(200, 100, Some(Rgba([128, 128, 128, 255])))
    }

    fn ink_bounds(surface: &Surface) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in surface.image().enumerate_pixels() {
            if p.0 == [128, 128, 128, 255] {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    #[test]
    fn test_text_uses_bundled_font() {
        let mut surface = gray_canvas();
        let mut wm = TextWatermark::default();
        wm.text = "hello".into();
        assert!(draw_text_watermark(&mut surface, &wm));
        assert!(ink_bounds(&surface).is_some());
    }

    #[test]
    fn test_text_sits_against_bottom_right() {
        let mut surface = gray_canvas();
        let mut wm = TextWatermark::default();
        wm.text = "HI".into();
        wm.font_size = 40.0;
        wm.margin = 10.0;
        wm.opacity = 1.0;
        assert!(draw_text_watermark(&mut surface, &wm));

        let (x0, y0, x1, y1) = ink_bounds(&surface).expect("text was drawn");
        // Baseline at y = 90, right edge of the advance box at x = 190
        assert!(x0 >= 148 && x1 <= 193, "ink x {x0}..{x1}");
        assert!(x1 >= 180, "ink x {x0}..{x1}");
        assert!(y0 >= 55 && y1 <= 94, "ink y {y0}..{y1}");
        assert!(y1 >= 87, "ink y {y0}..{y1}");

        let pixels = surface.image().pixels();
        let (mut fill, mut outline) = (false, false);
        for p in pixels {
            fill |= p[0] > 230;
            outline |= p[0] < 60;
        }
        assert!(fill, "white fill is visible");
        assert!(outline, "dark outline is visible");
    }

    #[test]
    fn test_caller_font_overrides_bundled() {
        let bytes = include_bytes!("../assets/DejaVuSans.ttf").to_vec();
        let mut wm = TextWatermark::default();
        wm.text = "HI".into();
        wm.font_size = 40.0;
        wm.opacity = 1.0;
        wm.font = Some(load_font(bytes).expect("font"));

        let mut custom = gray_canvas();
        assert!(draw_text_watermark(&mut custom, &wm));
        wm.font = None;
        let mut bundled = gray_canvas();
        assert!(draw_text_watermark(&mut bundled, &wm));
        assert_eq!(custom, bundled);
    }

    #[test]
    fn test_huge_font_size_is_clamped() {
        let mut surface = gray_canvas();
        let mut wm = TextWatermark::default();
        wm.text = "I".into();
        wm.font_size = 1.0e9;
        wm.anchor = Anchor::BottomLeft;
        wm.margin = 0.0;
        wm.opacity = 1.0;
        assert!(draw_text_watermark(&mut surface, &wm));
        // The stem of a 2048px "I" starts ~170px in and covers the corner
        assert!(surface.image().pixels().any(|p| p[0] > 230));
    }

    #[test]
    fn test_text_off_canvas_is_skipped() {
        let mut surface = Surface::new(0, 0);
        let mut wm = TextWatermark::default();
        wm.text = "hello".into();
        wm.margin = 0.0;
        assert!(!draw_text_watermark(&mut surface, &wm));
    }

    #[test]
    fn test_logo_size() {
        let logo = DecodedImage::filled(40, 20, [0, 0, 0, 255]);
        assert_eq!(logo_size(&logo, 200, 12.0), Some((24, 12)));
        assert_eq!(logo_size(&logo, 200, 0.0), None);
        assert_eq!(logo_size(&logo, 3, 10.0), None);
        // Tall logo, height never drops below one pixel
        let wide = DecodedImage::filled(1000, 1, [0, 0, 0, 255]);
        assert_eq!(logo_size(&wide, 100, 10.0), Some((10, 1)));
    }

    #[test]
    fn test_oversized_logo_is_skipped() {
        let tall = DecodedImage::filled(1, 1000, [0, 0, 0, 255]);
        assert_eq!(logo_size(&tall, 20_000, 100.0), None);
    }

    #[test]
    fn test_draw_logo_bottom_right() {
        let mut surface = Surface::with_background(100, 50, Some(Rgba([0, 0, 0, 255])));
        let mut wm = LogoWatermark::default();
        wm.image = Some(Arc::new(DecodedImage::filled(10, 10, [255, 255, 255, 255])));
        wm.opacity = 1.0;
        wm.scale = 10.0;
        wm.margin = 5.0;

        assert!(draw_logo(&mut surface, &wm, FilterType::Nearest));
        // 10x10 logo, bottom-right corner at (95, 45)
        let img = surface.image();
        assert_eq!(img.get_pixel(85, 35), &Rgba([255, 255, 255, 255]));
        assert_eq!(img.get_pixel(94, 44), &Rgba([255, 255, 255, 255]));
        assert_eq!(img.get_pixel(95, 45), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(84, 34), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_logo_respects_opacity() {
        let mut surface = Surface::with_background(20, 20, Some(Rgba([0, 0, 0, 255])));
        let mut wm = LogoWatermark::default();
        wm.image = Some(Arc::new(DecodedImage::filled(4, 4, [255, 255, 255, 255])));
        wm.opacity = 0.5;
        wm.scale = 50.0;
        wm.anchor = Anchor::TopLeft;
        wm.margin = 0.0;

        assert!(draw_logo(&mut surface, &wm, FilterType::Bilinear));
        let p = surface.image().get_pixel(0, 0);
        assert!((127..=128).contains(&p[0]));
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_no_logo_is_noop() {
        let mut surface = Surface::new(8, 8);
        assert!(!draw_logo(&mut surface, &LogoWatermark::default(), FilterType::Bilinear));
    }
}

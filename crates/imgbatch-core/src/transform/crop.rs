//! Crop-and-scale onto the output surface.
//!
//! The resolved source rectangle is cut out of the decoded image and
//! resampled to the target size with the `image` crate's filters, then
//! drawn over the (optionally pre-filled) output surface. Regions with any
//! transparency are resampled premultiplied so hidden colors do not bleed
//! into visible edges.

use image::imageops;
use image::{Rgba, Rgba32FImage, RgbaImage};

use super::surface::Surface;
use crate::decode::{DecodeError, DecodedImage, FilterType};
use crate::geometry::Geometry;

/// Render the crop region of `source` scaled to the target size.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` if the pixel buffer does not match
/// the image dimensions.
pub fn render_crop(
    source: &DecodedImage,
    geometry: &Geometry,
    background: Option<Rgba<u8>>,
    filter: FilterType,
) -> Result<Surface, DecodeError> {
    let view = source.as_view().ok_or_else(|| {
        DecodeError::CorruptedFile(format!(
            "pixel buffer of {} bytes does not hold {}x{} RGBA",
            source.pixels.len(),
            source.width,
            source.height
        ))
    })?;

    // Clamped to the image like `imageops::crop_imm`
    let rect = geometry.source;
    let x0 = rect.x.min(source.width);
    let y0 = rect.y.min(source.height);
    let width = rect.width.min(source.width - x0);
    let height = rect.height.min(source.height - y0);
    let region = RgbaImage::from_fn(width, height, |x, y| *view.get_pixel(x0 + x, y0 + y));

    // Fast path: no resampling when the crop already has the target size
    let (tw, th) = (geometry.target_width, geometry.target_height);
    let scaled = if region.dimensions() == (tw, th) {
        region
    } else if region.pixels().all(|p| p[3] == u8::MAX) {
        imageops::resize(&region, tw, th, filter.to_image_filter())
    } else {
        resize_premultiplied(&region, tw, th, filter)
    };

    if background.is_none() {
        return Ok(Surface::from_image(scaled));
    }
    let mut surface = Surface::with_background(tw, th, background);
    surface.draw_at(&scaled, 0, 0, 1.0);
    Ok(surface)
}

/// Resample with color weighted by alpha, then divide it back out.
fn resize_premultiplied(region: &RgbaImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(region.width(), region.height(), |x, y| {
        let [r, g, b, a] = region.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });
    let resized = imageops::resize(&premultiplied, width, height, filter.to_image_filter());

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let alpha = (a * 255.0).round().clamp(0.0, 255.0);
        if alpha <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let channel = |c: f32| (c / a * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([channel(r), channel(g), channel(b), alpha as u8])
    })
}

//! Single-image conversion pipeline.
//!
//! ## Stage Order
//! 1. Decode the item's source
//! 2. Resolve crop rectangle and output size
//! 3. Crop and scale into a target-size surface
//! 4. Rotate and mirror onto an expanded canvas
//! 5. Contrast / exposure and sharpen
//! 6. Text watermark
//! 7. Logo watermark
//! 8. Encode and name the result
//!
//! Stages 3 and 4 both apply the background fill rule to the surface they
//! allocate.

use image::{Rgba, RgbaImage};
use log::debug;

use crate::color::HexColor;
use crate::decode::DecodedImage;
use crate::encode::encode_image;
use crate::error::ConvertError;
use crate::filter::apply_filters;
use crate::geometry::{resolve_geometry, CropRect, Focal};
use crate::queue::ImageItem;
use crate::settings::{OutputKind, Settings};
use crate::transform::{render_crop, rotate_flip, Surface};
use crate::watermark::{draw_logo, draw_text_watermark};

/// One converted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    /// Suggested file name, e.g. `photo_converted.webp`.
    pub name: String,
    pub kind: OutputKind,
    pub width: u32,
    pub height: u32,
}

/// Fill color for a freshly allocated surface, or `None` to leave it
/// transparent.
///
/// Outputs without an alpha channel are always filled, using the color at
/// full opacity. Otherwise only a solid (6-digit) color fills.
pub fn background_fill(kind: OutputKind, color: &HexColor) -> Option<Rgba<u8>> {
    if !kind.has_alpha() {
        Some(color.opaque())
    } else if color.is_solid() {
        Some(color.rgba())
    } else {
        None
    }
}

/// Suggested output name: the last extension is replaced by
/// `_converted.<ext>`.
pub fn output_name(display_name: &str, kind: OutputKind) -> String {
    let stem = match display_name.rfind('.') {
        Some(dot) if dot + 1 < display_name.len() => &display_name[..dot],
        _ => display_name,
    };
    format!("{stem}_converted.{}", kind.extension())
}

/// Run stages 2 to 7 on a decoded source.
pub fn render(
    source: &DecodedImage,
    manual_crop: Option<&CropRect>,
    focal: Focal,
    settings: &Settings,
) -> Result<RgbaImage, ConvertError> {
    let geometry = resolve_geometry(source.width, source.height, manual_crop, focal, settings)?;
    debug!(
        "crop {}x{} at ({}, {}) -> {}x{}",
        geometry.source.width,
        geometry.source.height,
        geometry.source.x,
        geometry.source.y,
        geometry.target_width,
        geometry.target_height
    );

    let background = background_fill(settings.output.kind, &settings.crop.background);
    let base = render_crop(source, &geometry, background, settings.resample)?;

    let mut surface = if settings.geometry.is_identity() {
        base
    } else {
        let rotated = rotate_flip(base.image(), &settings.geometry, background, settings.resample);
        debug!(
            "rotated {} degrees to {}x{}",
            settings.geometry.wrapped_rotation(),
            rotated.width(),
            rotated.height()
        );
        rotated
    };

    if settings.filters_enabled() {
        let image = surface.image_mut();
        let (width, height) = image.dimensions();
        apply_filters(image, width, height, settings);
    }

    draw_overlays(&mut surface, settings);
    Ok(surface.into_image())
}

fn draw_overlays(surface: &mut Surface, settings: &Settings) {
    draw_text_watermark(surface, &settings.text);
    draw_logo(surface, &settings.logo, settings.resample);
}

/// Convert one queued image.
///
/// # Errors
///
/// Any [`ConvertError`]; nothing partial is returned.
pub fn compose(item: &ImageItem, settings: &Settings) -> Result<OutputArtifact, ConvertError> {
    let source = item.source.decode()?;
    let image = render(&source, item.manual_crop.as_ref(), item.focal, settings)?;

    let kind = settings.output.kind;
    let (width, height) = image.dimensions();
    let bytes = encode_image(&image, kind, settings.output.quality)?;
    let name = output_name(&item.display_name, kind);
    debug!("converted '{}' to '{name}' ({} bytes)", item.display_name, bytes.len());

    Ok(OutputArtifact {
        bytes,
        name,
        kind,
        width,
        height,
    })
}

//! Single-image conversion WASM bindings.
//!
//! # Functions
//!
//! - [`resolve_geometry`] - Crop rectangle and output size, for previews
//! - [`convert_image`] - Run the full pipeline on one decoded image
//!
//! Crop rectangles are passed as `{ x, y, width, height }` objects in source
//! pixels, or `undefined` for none. Focal points are percentages.

use crate::types::{JsArtifact, JsDecodedImage, JsSettings};
use imgbatch_core::compose::{compose, OutputArtifact};
use imgbatch_core::decode::DecodedImage;
use imgbatch_core::error::ConvertError;
use imgbatch_core::geometry::{self, CropRect, Focal, Geometry};
use imgbatch_core::queue::{ImageItem, ImageSource, ItemId};
use imgbatch_core::settings::Settings;
use serde::Deserialize;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Crop rectangle as sent from JS; fractional values come from UI drags.
#[derive(Debug, Clone, Copy, Deserialize)]
struct CropInput {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl From<CropInput> for CropRect {
    fn from(input: CropInput) -> Self {
        CropRect::new(
            input.x.round() as i64,
            input.y.round() as i64,
            input.width.round() as i64,
            input.height.round() as i64,
        )
    }
}

pub(crate) fn parse_crop(value: JsValue) -> Result<Option<CropRect>, JsValue> {
    let input: Option<CropInput> = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid crop rectangle: {}", e)))?;
    Ok(input.map(CropRect::from))
}

/// Resolve the crop rectangle and output size for an image.
///
/// Returns `{ source: { x, y, width, height }, targetWidth, targetHeight }`.
#[wasm_bindgen]
pub fn resolve_geometry(
    width: u32,
    height: u32,
    settings: &JsSettings,
    crop: JsValue,
    focal_x: f64,
    focal_y: f64,
) -> Result<JsValue, JsValue> {
    let crop = parse_crop(crop)?;
    let geometry = resolve(width, height, crop, Focal::new(focal_x, focal_y), settings.settings())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&geometry).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert one decoded image with the given settings.
///
/// # Errors
///
/// Returns the conversion error message (invalid crop, oversized output,
/// encoder failure).
#[wasm_bindgen]
pub fn convert_image(
    image: &JsDecodedImage,
    name: &str,
    settings: &JsSettings,
    crop: JsValue,
    focal_x: f64,
    focal_y: f64,
) -> Result<JsArtifact, JsValue> {
    let crop = parse_crop(crop)?;
    convert(image.to_decoded(), name, crop, Focal::new(focal_x, focal_y), settings.settings())
        .map(JsArtifact::from_artifact)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn resolve(
    width: u32,
    height: u32,
    crop: Option<CropRect>,
    focal: Focal,
    settings: &Settings,
) -> Result<Geometry, ConvertError> {
    geometry::resolve_geometry(width, height, crop.as_ref(), focal, settings)
}

fn convert(
    image: DecodedImage,
    name: &str,
    crop: Option<CropRect>,
    focal: Focal,
    settings: &Settings,
) -> Result<OutputArtifact, ConvertError> {
    let mut item = ImageItem::new(ItemId(0), ImageSource::Decoded(Arc::new(image)), name);
    item.manual_crop = crop;
    item.focal = focal;
    compose(&item, settings)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_convert_image_defaults_to_webp() {
        let settings = JsSettings::new(JsValue::UNDEFINED).unwrap();
        let image = JsDecodedImage::new(2, 2, vec![255; 16]).unwrap();
        let artifact = convert_image(&image, "a.png", &settings, JsValue::UNDEFINED, 50.0, 50.0).unwrap();
        assert_eq!(artifact.name(), "a_converted.webp");
        assert_eq!(artifact.mime_type(), "image/webp");
    }

    #[wasm_bindgen_test]
    fn test_resolve_geometry_rejects_oversized_box() {
        let mut settings = Settings::new();
        settings.resize.mode = imgbatch_core::settings::ResizeMode::FixedPixels;
        settings.resize.width = 100_000;
        settings.resize.height = 100_000;
        let settings = JsSettings::from_settings(settings);
        assert!(resolve_geometry(10, 10, &settings, JsValue::NULL, 50.0, 50.0).is_err());
    }
}

//! WASM-compatible wrapper types for images, settings and results.
//!
//! This module provides JavaScript-friendly types that wrap the core imgbatch
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use std::sync::Arc;

use imgbatch_core::batch::{BatchOutcome, BatchReport, PackagedArchive};
use imgbatch_core::compose::OutputArtifact;
use imgbatch_core::decode::DecodedImage;
use imgbatch_core::settings::Settings;
use imgbatch_core::watermark::load_font;
use wasm_bindgen::prelude::*;

/// A decoded image wrapper for JavaScript.
///
/// Pixels are straight RGBA, 4 bytes per pixel, row-major, the same layout
/// as `ImageData.data` in the browser.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create a new JsDecodedImage from dimensions and RGBA pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsDecodedImage, JsValue> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(JsValue::from_str(&format!(
                "Expected {expected} RGBA bytes for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(JsDecodedImage {
            width,
            height,
            pixels,
        })
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (a copy).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert back to a core DecodedImage (clones the pixel data).
    pub(crate) fn to_decoded(&self) -> DecodedImage {
        DecodedImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// Conversion settings for JavaScript.
///
/// Built from a plain JS object with camelCase keys; missing keys take their
/// defaults. The logo and font are attached separately since they are
/// binary resources.
#[wasm_bindgen]
pub struct JsSettings {
    inner: Settings,
}

#[wasm_bindgen]
impl JsSettings {
    /// Parse settings from a JS object (`undefined` or `null` give defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(value: JsValue) -> Result<JsSettings, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::from_settings(Settings::new()));
        }
        let inner: Settings = serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        Ok(Self { inner })
    }

    /// The settings as a plain JS object, defaults filled in.
    pub fn to_object(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Use a decoded image as the logo watermark.
    pub fn set_logo(&mut self, logo: &JsDecodedImage) {
        self.inner.logo.image = Some(Arc::new(logo.to_decoded()));
    }

    pub fn clear_logo(&mut self) {
        self.inner.logo.image = None;
    }

    /// Load the font used for the text watermark from TTF/OTF bytes,
    /// replacing the bundled DejaVu Sans.
    pub fn set_font(&mut self, bytes: Vec<u8>) -> Result<(), JsValue> {
        self.attach_font(bytes).map_err(|e| JsValue::from_str(&e))
    }

    /// Go back to the bundled font.
    pub fn clear_font(&mut self) {
        self.inner.text.font = None;
    }

    #[wasm_bindgen(getter)]
    pub fn has_logo(&self) -> bool {
        self.inner.logo.image.is_some()
    }

    /// Whether a caller font overrides the bundled one.
    #[wasm_bindgen(getter)]
    pub fn has_font(&self) -> bool {
        self.inner.text.font.is_some()
    }
}

impl JsSettings {
    pub(crate) fn from_settings(inner: Settings) -> Self {
        Self { inner }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner
    }

    fn attach_font(&mut self, bytes: Vec<u8>) -> Result<(), String> {
        let font = load_font(bytes).map_err(|e| format!("Invalid font: {}", e))?;
        self.inner.text.font = Some(font);
        Ok(())
    }
}

/// One converted image for JavaScript.
#[wasm_bindgen]
pub struct JsArtifact {
    inner: OutputArtifact,
}

#[wasm_bindgen]
impl JsArtifact {
    /// Encoded bytes as Uint8Array (a copy).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// Suggested file name, e.g. `photo_converted.webp`.
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name.clone()
    }

    /// MIME type for building a `Blob`.
    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.kind.mime_type().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }
}

impl JsArtifact {
    pub(crate) fn from_artifact(inner: OutputArtifact) -> Self {
        Self { inner }
    }
}

/// Result of converting a whole queue.
#[wasm_bindgen]
pub struct JsBatchResult {
    archive: Option<PackagedArchive>,
    converted: usize,
    failures: Vec<String>,
    outcome: BatchOutcome,
    cancelled: bool,
}

#[wasm_bindgen]
impl JsBatchResult {
    /// Archive bytes, or `undefined` when nothing was converted.
    pub fn archive_bytes(&self) -> Option<Vec<u8>> {
        self.archive.as_ref().map(|a| a.bytes.clone())
    }

    /// Suggested archive name, `converted_<unix-millis>.zip`.
    #[wasm_bindgen(getter)]
    pub fn archive_name(&self) -> Option<String> {
        self.archive.as_ref().map(|a| a.name.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn converted(&self) -> usize {
        self.converted
    }

    /// One `"<name>: <reason>"` message per failed item.
    pub fn failures(&self) -> Vec<String> {
        self.failures.clone()
    }

    /// `"empty"`, `"complete"`, `"partial-failure"` or `"total-failure"`.
    #[wasm_bindgen(getter)]
    pub fn outcome(&self) -> String {
        match self.outcome {
            BatchOutcome::Empty => "empty",
            BatchOutcome::Complete => "complete",
            BatchOutcome::PartialFailure => "partial-failure",
            BatchOutcome::TotalFailure => "total-failure",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl JsBatchResult {
    /// Package a batch report, stamping the archive with `unix_millis`.
    pub(crate) fn from_report(report: BatchReport, unix_millis: u64) -> Result<Self, String> {
        let outcome = report.outcome();
        let cancelled = report.cancelled;
        let converted = report.artifacts.len();
        let failures = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.name, f.error))
            .collect();
        let archive = report.into_archive(unix_millis).map_err(|e| e.to_string())?;

        Ok(Self {
            archive,
            converted,
            failures,
            outcome,
            cancelled,
        })
    }
}

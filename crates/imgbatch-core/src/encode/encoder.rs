//! Encoders for converted images.
//!
//! JPEG goes through the `image` crate's baseline encoder with a quality
//! setting. WebP is lossy at the same quality through libwebp; on wasm32,
//! where libwebp is not built, it falls back to the `image` crate's lossless
//! encoder. PNG is lossless. PNG and WebP keep the alpha channel.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
#[cfg(target_arch = "wasm32")]
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use log::debug;
use thiserror::Error;

use crate::settings::OutputKind;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{kind:?} encoding failed: {message}")]
    EncodingFailed { kind: OutputKind, message: String },
}

fn validate(pixels: &[u8], width: u32, height: u32, channels: usize) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * channels;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Map a 0.0-1.0 quality factor onto the 1-100 JPEG scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 92;
    }
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Map a 0.0-1.0 quality factor onto libwebp's 0-100 scale.
pub fn webp_quality(quality: f32) -> f32 {
    if !quality.is_finite() {
        return 92.0;
    }
    quality.clamp(0.0, 1.0) * 100.0
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height, 3)?;

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            kind: OutputKind::Jpeg,
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height, 4)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            kind: OutputKind::Png,
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Encode RGBA pixel data to lossy WebP bytes at `quality` (0-100).
#[cfg(not(target_arch = "wasm32"))]
pub fn encode_webp(pixels: &[u8], width: u32, height: u32, quality: f32) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height, 4)?;

    let memory = webp::Encoder::from_rgba(pixels, width, height)
        .encode_simple(false, quality.clamp(0.0, 100.0))
        .map_err(|e| EncodeError::EncodingFailed {
            kind: OutputKind::Webp,
            message: format!("{e:?}"),
        })?;
    Ok(memory.to_vec())
}

/// Encode RGBA pixel data to lossless WebP bytes; `quality` is unused.
#[cfg(target_arch = "wasm32")]
pub fn encode_webp(pixels: &[u8], width: u32, height: u32, _quality: f32) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height, 4)?;

    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            kind: OutputKind::Webp,
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Encode a finished surface in the requested format.
///
/// `quality` is the 0.0-1.0 factor from the settings. For JPEG the alpha
/// channel is dropped; callers fill an opaque background first.
pub fn encode_image(image: &RgbaImage, kind: OutputKind, quality: f32) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    let bytes = match kind {
        OutputKind::Jpeg => {
            let rgb: Vec<u8> = image
                .as_raw()
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            encode_jpeg(&rgb, width, height, jpeg_quality(quality))?
        }
        OutputKind::Png => encode_png(image.as_raw(), width, height)?,
        OutputKind::Webp => encode_webp(image.as_raw(), width, height, webp_quality(quality))?,
    };
    debug!("encoded {width}x{height} as {} ({} bytes)", kind.mime_type(), bytes.len());
    Ok(bytes)
}

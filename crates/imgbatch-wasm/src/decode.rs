//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode any supported image into upright RGBA pixels
//! - [`probe_dimensions`] - Read upright dimensions without decoding pixels
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, probe_dimensions } from '@imgbatch/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const [w, h] = probe_dimensions(bytes);
//! const image = decode_image(bytes);
//! ```

use crate::types::JsDecodedImage;
use imgbatch_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an image from bytes.
///
/// The format is detected from the leading bytes and EXIF orientation is
/// applied, so the pixels are upright the way a browser displays them.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported or intact image.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Read `[width, height]` from the image header, after EXIF orientation.
#[wasm_bindgen]
pub fn probe_dimensions(bytes: &[u8]) -> Result<Vec<u32>, JsValue> {
    decode::probe_dimensions(bytes)
        .map(|(w, h)| vec![w, h])
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Tests for decode bindings.
///
/// Functions returning `Result<T, JsValue>` only work on wasm32 targets; the
/// underlying decoding is covered by the tests in `imgbatch_core::decode`.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use imgbatch_core::encode::encode_png;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_image_invalid() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_image_empty() {
        assert!(decode_image(&[]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_png() {
        let png = encode_png(&[1, 2, 3, 4].repeat(6), 3, 2).unwrap();
        let image = decode_image(&png).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.byte_length(), 24);
    }

    #[wasm_bindgen_test]
    fn test_probe_png() {
        let png = encode_png(&[0; 5 * 7 * 4], 5, 7).unwrap();
        assert_eq!(probe_dimensions(&png).unwrap(), vec![5, 7]);
    }
}

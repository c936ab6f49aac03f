//! Image encoding for imgbatch.
//!
//! This module provides functionality for:
//! - Encoding JPEG with a configurable quality
//! - Encoding WebP with a configurable quality, keeping alpha
//! - Encoding lossless PNG with alpha
//!
//! # Examples
//!
//! ```ignore
//! use imgbatch_core::encode::encode_jpeg;
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let jpeg_bytes = encode_jpeg(&pixels, 100, 100, 90).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod encoder;

pub use encoder::{encode_image, encode_jpeg, encode_png, encode_webp, jpeg_quality, webp_quality, EncodeError};

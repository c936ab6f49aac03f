//! Image decoding for imgbatch.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP images into straight RGBA buffers
//! - Applying EXIF orientation so pixels are upright
//! - Reading dimensions without a full decode
//!
//! # Examples
//!
//! ```ignore
//! use imgbatch_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod reader;
mod types;

pub use reader::{decode_image, get_orientation, probe_dimensions};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};

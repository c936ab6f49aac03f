//! imgbatch Core - Batch image conversion library
//!
//! This crate converts queued images with one settings snapshot: crop,
//! resize, rotate, enhance, watermark and re-encode each image, then package
//! the results into a store-only ZIP archive.
//!
//! The crate has no I/O of its own. Callers hand in encoded bytes or decoded
//! pixels and receive encoded bytes back.

pub mod archive;
pub mod batch;
pub mod color;
pub mod compose;
pub mod crc32;
pub mod decode;
pub mod encode;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod queue;
pub mod settings;
pub mod transform;
pub mod watermark;

pub use archive::{package_archive, ArchiveError, ArchiveWriter};
pub use batch::{archive_name, convert_batch, BatchOutcome, BatchReport, CancelToken, ItemFailure, PackagedArchive};
pub use color::HexColor;
pub use compose::{compose, output_name, render, OutputArtifact};
pub use crc32::crc32;
pub use decode::{decode_image, probe_dimensions, DecodeError, DecodedImage, FilterType};
pub use encode::EncodeError;
pub use error::ConvertError;
pub use geometry::{resolve_geometry, CropRect, Focal, Geometry, PixelRect};
pub use queue::{ImageItem, ImageQueue, ImageSource, ItemId, MoveDirection};
pub use settings::{Anchor, AspectMode, OutputKind, ResizeMode, Settings};
pub use watermark::{load_font, place};

/// Crate version, for display in the UI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! imgbatch WASM - WebAssembly bindings for imgbatch
//!
//! This crate exposes the imgbatch-core conversion pipeline to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - Wrapper types for images, settings and results
//! - `decode` - Image decoding and dimension probing
//! - `convert` - Geometry preview and single-image conversion
//! - `queue` - Image queue and batch conversion
//! - `archive` - Store-only ZIP packaging
//! - `logger` - `log` output to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsQueue, JsSettings } from '@imgbatch/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const queue = new JsQueue();
//! queue.import(file.name, new Uint8Array(await file.arrayBuffer()));
//! const result = queue.convert_all(new JsSettings({ resize: { mode: 'percent', percent: 50 } }));
//! console.log(`${result.converted} converted, outcome ${result.outcome}`);
//! ```

use wasm_bindgen::prelude::*;

mod archive;
mod convert;
mod decode;
mod logger;
mod queue;
mod types;

// Re-export public types
pub use archive::{archive_name, crc32, package_archive, JsArchiveWriter};
pub use convert::{convert_image, resolve_geometry};
pub use decode::{decode_image, probe_dimensions};
pub use logger::set_log_level;
pub use queue::JsQueue;
pub use types::{JsArtifact, JsBatchResult, JsDecodedImage, JsSettings};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    imgbatch_core::VERSION.to_string()
}

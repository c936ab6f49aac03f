//! ZIP archive WASM bindings.
//!
//! # Functions
//!
//! - [`package_archive`] - Build an archive from parallel name and buffer lists
//! - [`crc32`] - CRC-32 of a byte buffer
//! - [`archive_name`] - Default archive file name for a timestamp
//!
//! [`JsArchiveWriter`] builds an archive one entry at a time, which keeps
//! only one encoded file alive on the JS side while packaging.

use imgbatch_core::archive::{self, ArchiveWriter};
use imgbatch_core::batch;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;

/// Incremental store-only archive builder.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsArchiveWriter {
    inner: ArchiveWriter,
}

#[wasm_bindgen]
impl JsArchiveWriter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry; names are stored as given.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner
            .add_entry(name, bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Number of entries added so far.
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Write the central directory and return the archive bytes.
    ///
    /// The writer cannot be used afterwards.
    pub fn finish(self) -> Result<Vec<u8>, JsValue> {
        self.inner.finish().map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Package files into a store-only archive.
///
/// `names[i]` is the entry name for `buffers[i]`, a `Uint8Array`.
#[wasm_bindgen]
pub fn package_archive(names: Vec<String>, buffers: Array) -> Result<Vec<u8>, JsValue> {
    let data: Vec<Vec<u8>> = buffers
        .iter()
        .map(|value| Uint8Array::new(&value).to_vec())
        .collect();
    package(names, data).map_err(|e| JsValue::from_str(&e))
}

/// CRC-32 (IEEE) of `bytes`.
#[wasm_bindgen]
pub fn crc32(bytes: &[u8]) -> u32 {
    imgbatch_core::crc32(bytes)
}

/// `converted_<unix_millis>.zip`
#[wasm_bindgen]
pub fn archive_name(unix_millis: f64) -> String {
    batch::archive_name(unix_millis.max(0.0) as u64)
}

fn package(names: Vec<String>, data: Vec<Vec<u8>>) -> Result<Vec<u8>, String> {
    if names.len() != data.len() {
        return Err(format!(
            "Got {} names for {} buffers",
            names.len(),
            data.len()
        ));
    }
    let entries: Vec<(String, Vec<u8>)> = names.into_iter().zip(data).collect();
    archive::package_archive(&entries).map_err(|e| e.to_string())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_package_archive_from_arrays() {
        let buffers = Array::new();
        buffers.push(&Uint8Array::from(&[1u8, 2, 3][..]));
        let bytes = package_archive(vec!["x.bin".to_string()], buffers).unwrap();
        assert_eq!(&bytes[0..4], &[0x50, 0x4B, 0x03, 0x04]);
    }

    #[wasm_bindgen_test]
    fn test_writer_rejects_long_name() {
        let mut writer = JsArchiveWriter::new();
        assert!(writer.add(&"n".repeat(70_000), &[]).is_err());
    }
}

//! Image queue WASM bindings.
//!
//! `JsQueue` owns the imported images and their crop state. Item ids are
//! plain numbers on the JS side.
//!
//! # Example
//!
//! ```typescript
//! const queue = new JsQueue();
//! for (const file of files) {
//!   queue.import(file.name, new Uint8Array(await file.arrayBuffer()));
//! }
//! const result = queue.convert_all(new JsSettings({ output: { kind: 'jpeg' } }));
//! if (result.archive_name) download(result.archive_bytes(), result.archive_name);
//! ```

use crate::types::{JsArtifact, JsBatchResult, JsSettings};
use imgbatch_core::batch::convert_batch;
use imgbatch_core::compose::compose;
use imgbatch_core::geometry::CropRect;
use imgbatch_core::queue::{ImageQueue, ImageSource, ItemId, MoveDirection};
use imgbatch_core::settings::Settings;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[inline]
fn item_id(id: f64) -> ItemId {
    ItemId(id as u64)
}

#[inline]
fn js_id(id: ItemId) -> f64 {
    id.0 as f64
}

/// Ordered list of images to convert.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsQueue {
    inner: ImageQueue,
}

#[wasm_bindgen]
impl JsQueue {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and append an image, returning its id.
    pub fn import(&mut self, name: &str, bytes: &[u8]) -> Result<f64, JsValue> {
        self.inner
            .import(name, bytes)
            .map(js_id)
            .map_err(|e| JsValue::from_str(&format!("{}: {}", name, e)))
    }

    /// Append encoded bytes without decoding; they are decoded at conversion.
    pub fn push_encoded(&mut self, name: &str, bytes: Vec<u8>) -> f64 {
        js_id(self.inner.push(name, ImageSource::Encoded(Arc::from(bytes))))
    }

    /// Remove an item; its pixels are released unless a conversion holds them.
    pub fn remove(&mut self, id: f64) -> bool {
        self.inner.remove(item_id(id)).is_some()
    }

    pub fn move_up(&mut self, id: f64) -> bool {
        self.inner.move_item(item_id(id), MoveDirection::Up)
    }

    pub fn move_down(&mut self, id: f64) -> bool {
        self.inner.move_item(item_id(id), MoveDirection::Down)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Save a manual crop in source pixels (values are rounded).
    pub fn save_crop(&mut self, id: f64, x: f64, y: f64, width: f64, height: f64) -> bool {
        let rect = CropRect::new(
            x.round() as i64,
            y.round() as i64,
            width.round() as i64,
            height.round() as i64,
        );
        self.inner.save_crop(item_id(id), rect)
    }

    pub fn reset_crop(&mut self, id: f64) -> bool {
        self.inner.reset_crop(item_id(id))
    }

    /// Set the focal point in percent (0-100 on each axis).
    pub fn set_focal(&mut self, id: f64, x: f64, y: f64) -> bool {
        self.inner.set_focal(item_id(id), x, y)
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Item ids in queue order.
    pub fn ids(&self) -> Vec<f64> {
        self.inner.iter().map(|item| js_id(item.id)).collect()
    }

    /// Display name of an item.
    pub fn name(&self, id: f64) -> Option<String> {
        self.inner.get(item_id(id)).map(|item| item.display_name.clone())
    }

    /// `[width, height]` of a decoded item, `undefined` otherwise.
    pub fn dimensions(&self, id: f64) -> Option<Vec<u32>> {
        match &self.inner.get(item_id(id))?.source {
            ImageSource::Decoded(image) => Some(vec![image.width, image.height]),
            ImageSource::Encoded(_) => None,
        }
    }

    /// Convert a single item.
    pub fn convert_item(&self, id: f64, settings: &JsSettings) -> Result<JsArtifact, JsValue> {
        let item = self
            .inner
            .get(item_id(id))
            .ok_or_else(|| JsValue::from_str(&format!("No queued image with id {}", id)))?;
        compose(item, settings.settings())
            .map(JsArtifact::from_artifact)
            .map_err(|e| JsValue::from_str(&format!("{}: {}", item.display_name, e)))
    }

    /// Convert every item and package the results into one archive.
    pub fn convert_all(&self, settings: &JsSettings) -> Result<JsBatchResult, JsValue> {
        let now = js_sys::Date::now().max(0.0) as u64;
        self.convert_all_at(settings.settings(), now)
            .map_err(|e| JsValue::from_str(&e))
    }
}

impl JsQueue {
    fn convert_all_at(&self, settings: &Settings, unix_millis: u64) -> Result<JsBatchResult, String> {
        let report = convert_batch(self.inner.items(), settings, None);
        JsBatchResult::from_report(report, unix_millis)
    }
}

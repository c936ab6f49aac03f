//! Ordered queue of images awaiting conversion.
//!
//! Items hold their source behind an `Arc`: removing an item from the queue
//! drops the queue's handle, while a batch that is still converting keeps
//! its own clone alive until it finishes.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::geometry::{CropRect, Focal};

/// Stable identifier of a queued image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// Pixel source of a queued image.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Already decoded, upright RGBA pixels.
    Decoded(Arc<DecodedImage>),
    /// Encoded file bytes, decoded when the item is converted.
    Encoded(Arc<[u8]>),
}

impl ImageSource {
    /// Decoded pixels, decoding encoded bytes on demand.
    pub fn decode(&self) -> Result<Arc<DecodedImage>, DecodeError> {
        match self {
            ImageSource::Decoded(image) => Ok(Arc::clone(image)),
            ImageSource::Encoded(bytes) => decode_image(bytes).map(Arc::new),
        }
    }
}

/// One queued image with its per-item crop state.
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub id: ItemId,
    pub source: ImageSource,
    /// Original file name, used to derive the output name.
    pub display_name: String,
    /// Crop saved in source pixels; overrides automatic cropping.
    pub manual_crop: Option<CropRect>,
    pub focal: Focal,
}

impl ImageItem {
    pub fn new(id: ItemId, source: ImageSource, display_name: impl Into<String>) -> Self {
        Self {
            id,
            source,
            display_name: display_name.into(),
            manual_crop: None,
            focal: Focal::default(),
        }
    }
}

/// Direction for [`ImageQueue::move_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered list of images; the order is the conversion and archive order.
#[derive(Debug, Default)]
pub struct ImageQueue {
    items: Vec<ImageItem>,
    next_id: u64,
}

impl ImageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    /// Decode `bytes` and append the result.
    ///
    /// # Errors
    ///
    /// Returns the decode error; the queue is left unchanged.
    pub fn import(&mut self, display_name: impl Into<String>, bytes: &[u8]) -> Result<ItemId, DecodeError> {
        let image = decode_image(bytes)?;
        Ok(self.push(display_name, ImageSource::Decoded(Arc::new(image))))
    }

    /// Append an item with the given source.
    pub fn push(&mut self, display_name: impl Into<String>, source: ImageSource) -> ItemId {
        let id = self.allocate_id();
        let item = ImageItem::new(id, source, display_name);
        debug!("queued '{}' as {:?}", item.display_name, id);
        self.items.push(item);
        id
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut ImageItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Remove an item, handing it back to the caller.
    pub fn remove(&mut self, id: ItemId) -> Option<ImageItem> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Swap an item with its neighbour. Returns `false` at the ends or for
    /// an unknown id.
    pub fn move_item(&mut self, id: ItemId, direction: MoveDirection) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.items.len() => index + 1,
            _ => return false,
        };
        self.items.swap(index, target);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Store a manual crop for an item.
    pub fn save_crop(&mut self, id: ItemId, rect: CropRect) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.manual_crop = Some(rect);
                true
            }
            None => false,
        }
    }

    /// Forget an item's manual crop.
    pub fn reset_crop(&mut self, id: ItemId) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.manual_crop = None;
                true
            }
            None => false,
        }
    }

    /// Set an item's focal point in percent; values are clamped to 0-100.
    pub fn set_focal(&mut self, id: ItemId, x: f64, y: f64) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.focal = Focal::new(x, y);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&ImageItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

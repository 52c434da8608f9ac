//! Retained frames for still export.
//!
//! Only frames that carry at least one label are kept, and they are kept as
//! encoded JPEG bytes rather than raw RGB. The bytes are produced from the
//! same buffer that was appended to the video sink, so every still written
//! later shows exactly the pixels the video received at that index.

use std::collections::BTreeMap;
use std::sync::Arc;

use image::RgbImage;

use crate::export::encode_still;

#[derive(Debug, Default)]
pub struct FrameStore {
    frames: BTreeMap<u32, Arc<[u8]>>,
    retained_bytes: usize,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and keep frame `index`. Retaining an index twice keeps the
    /// first copy.
    pub fn retain(&mut self, index: u32, image: &RgbImage) -> Result<(), image::ImageError> {
        if self.frames.contains_key(&index) {
            return Ok(());
        }
        let bytes: Arc<[u8]> = encode_still(image)?.into();
        self.retained_bytes += bytes.len();
        self.frames.insert(index, bytes);
        Ok(())
    }

    /// Encoded still of frame `index`, shared read-only.
    pub fn get(&self, index: u32) -> Option<Arc<[u8]>> {
        self.frames.get(&index).cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total size of the retained stills.
    pub fn retained_bytes(&self) -> usize {
        self.retained_bytes
    }
}

//! Image database

use std::collections::BTreeMap;

/// Binary image data with optional declared type and pixel size
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    /// Declared MIME type; sniffed from the bytes when absent
    pub mime: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Images available to the document, keyed by image id
#[derive(Clone, Debug, Default)]
pub struct ImageDb {
    images: BTreeMap<String, ImageData>,
}

impl ImageDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, data: ImageData) {
        self.images.insert(id.into(), data);
    }

    pub fn with_image(mut self, id: impl Into<String>, data: ImageData) -> Self {
        self.insert(id, data);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ImageData> {
        self.images.get(id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

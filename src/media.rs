//! Media store
//!
//! Images become binary parts under `/word/media/`. One part is stored per
//! distinct image id; each part (body, footnotes, comments) that shows the
//! image gets one image relationship to it.
//!
//! Dimensions are in pixels at 96 DPI; DrawingML wants EMUs:
//! - 914400 EMUs = 1 inch
//! - 9525 EMUs = 1 pixel

use crate::model::{ImageDb, ImageRef};
use crate::opc::{rel_types, PartUri};
use crate::registry::RelationshipRegistry;
use crate::warning::{WarningKind, Warnings};
use image::{ImageFormat, ImageReader};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

/// EMUs per pixel at 96 DPI
pub const EMU_PER_PIXEL: i64 = 9525;

/// Transparent 1x1 PNG used when image data is missing
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Convert pixels to EMUs
pub fn pixels_to_emu(px: u32) -> i64 {
    px as i64 * EMU_PER_PIXEL
}

/// A stored image binary
#[derive(Clone, Debug)]
pub struct MediaPart {
    pub uri: PartUri,
    pub content_type: String,
    pub data: Vec<u8>,
    /// Intrinsic size, if known
    pub size: Option<(u32, u32)>,
    pub placeholder: bool,
}

/// Images registered during export
#[derive(Clone, Debug, Default)]
pub struct MediaStore {
    /// Media parts by image id
    parts: BTreeMap<String, MediaPart>,
    /// Relationship id by (owning part, image id)
    rels: BTreeMap<(PartUri, String), String>,
    /// Part URIs that are taken (skeleton parts and our own)
    taken: BTreeSet<PartUri>,
    next_index: u32,
}

impl MediaStore {
    /// Create a store that avoids the given existing part URIs
    pub fn new<'a>(existing: impl IntoIterator<Item = &'a PartUri>) -> Self {
        Self {
            taken: existing.into_iter().cloned().collect(),
            next_index: 1,
            ..Default::default()
        }
    }

    /// Register `image_id` for display in `owner`, returning the
    /// relationship id. Repeated calls for the same pair return the same id.
    pub fn register(
        &mut self,
        registry: &mut RelationshipRegistry,
        owner: &PartUri,
        image_id: &str,
        images: &ImageDb,
        warnings: &mut Warnings,
    ) -> String {
        let key = (owner.clone(), image_id.to_string());
        if let Some(rel_id) = self.rels.get(&key) {
            return rel_id.clone();
        }

        if !self.parts.contains_key(image_id) {
            let part = self.store(image_id, images, warnings);
            self.parts.insert(image_id.to_string(), part);
        }

        let uri = &self.parts[image_id].uri;
        let rel_id = registry.register_part(owner, rel_types::IMAGE, uri);
        self.rels.insert(key, rel_id.clone());
        rel_id
    }

    fn store(&mut self, image_id: &str, images: &ImageDb, warnings: &mut Warnings) -> MediaPart {
        let (data, content_type, ext, size, placeholder) = match images.get(image_id) {
            Some(image) if !image.bytes.is_empty() => {
                let sniffed = sniff_format(&image.bytes);
                let (mime, ext) = match (&image.mime, sniffed) {
                    (Some(mime), _) => (mime.clone(), extension_for_mime(mime, sniffed)),
                    (None, Some((mime, ext))) => (mime.to_string(), ext),
                    (None, None) => ("application/octet-stream".to_string(), "bin"),
                };
                let size = match (image.width, image.height) {
                    (Some(w), Some(h)) => Some((w, h)),
                    _ => image_dimensions(&image.bytes),
                };
                (image.bytes.clone(), mime, ext, size, false)
            }
            _ => {
                warnings.push(
                    WarningKind::MissingImage,
                    format!("image '{}' not found, using placeholder", image_id),
                );
                (PLACEHOLDER_PNG.to_vec(), "image/png".to_string(), "png", None, true)
            }
        };

        let uri = self.next_uri(ext);
        log::debug!("storing image '{}' as {} ({})", image_id, uri, content_type);
        MediaPart {
            uri,
            content_type,
            data,
            size,
            placeholder,
        }
    }

    fn next_uri(&mut self, ext: &str) -> PartUri {
        loop {
            let uri = PartUri::from_string_unchecked(format!(
                "/word/media/image{}.{}",
                self.next_index, ext
            ));
            self.next_index += 1;
            if self.taken.insert(uri.clone()) {
                return uri;
            }
        }
    }

    /// Relationship id of `image_id` in `owner`
    pub fn rel_id(&self, owner: &PartUri, image_id: &str) -> Option<&str> {
        self.rels
            .get(&(owner.clone(), image_id.to_string()))
            .map(String::as_str)
    }

    /// Stored part of `image_id`
    pub fn part(&self, image_id: &str) -> Option<&MediaPart> {
        self.parts.get(image_id)
    }

    /// All stored parts in image id order
    pub fn parts(&self) -> impl Iterator<Item = &MediaPart> {
        self.parts.values()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Display size in pixels: explicit size, else intrinsic size, else the
/// default; scaled down proportionally to fit `max_width`
pub fn display_size(
    image: &ImageRef,
    intrinsic: Option<(u32, u32)>,
    default: (u32, u32),
    max_width: u32,
) -> (u32, u32) {
    let (w, h) = match (image.width, image.height, intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((iw, ih))) if iw > 0 => (w, scale(ih, w, iw)),
        (None, Some(h), Some((iw, ih))) if ih > 0 => (scale(iw, h, ih), h),
        (_, _, Some(size)) => size,
        _ => default,
    };
    let (w, h) = (w.max(1), h.max(1));

    if max_width > 0 && w > max_width {
        (max_width, scale(h, max_width, w).max(1))
    } else {
        (w, h)
    }
}

fn scale(value: u32, num: u32, den: u32) -> u32 {
    ((value as u64 * num as u64) / den.max(1) as u64) as u32
}

/// Detect the image format from its signature
pub fn sniff_format(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    match image::guess_format(bytes) {
        Ok(format) => {
            let ext = *format.extensions_str().first()?;
            Some((format.to_mime_type(), ext))
        }
        Err(_) if looks_like_svg(bytes) => Some(("image/svg+xml", "svg")),
        Err(_) => None,
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}

fn extension_for_mime(mime: &str, sniffed: Option<(&'static str, &'static str)>) -> &'static str {
    if let Some(ext) = ImageFormat::from_mime_type(mime).and_then(|f| f.extensions_str().first()) {
        return *ext;
    }
    match mime {
        "image/jpg" => "jpg",
        "image/svg+xml" => "svg",
        "image/x-emf" | "image/emf" => "emf",
        "image/x-wmf" | "image/wmf" => "wmf",
        _ => sniffed.map(|(_, ext)| ext).unwrap_or("bin"),
    }
}

/// Read pixel dimensions from the image header without decoding pixels
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok(size) => Some(size),
        Err(e) => {
            log::debug!("could not read image size: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageData;
    use crate::opc::well_known;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode(width, height, ImageFormat::Png)
    }

    #[test]
    fn test_sniff_by_signature() {
        assert_eq!(sniff_format(PLACEHOLDER_PNG), Some(("image/png", "png")));
        assert_eq!(sniff_format(b"GIF89a\x0a\x00\x14\x00rest"), Some(("image/gif", "gif")));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).map(|f| f.0), Some("image/jpeg"));
        assert_eq!(sniff_format(b"II*\0rest").map(|f| f.0), Some("image/tiff"));
        assert_eq!(sniff_format(b"<?xml version=\"1.0\"?><svg/>"), Some(("image/svg+xml", "svg")));
        assert_eq!(sniff_format(b"plain"), None);
    }

    #[test]
    fn test_dimensions_from_header() {
        assert_eq!(image_dimensions(PLACEHOLDER_PNG), Some((1, 1)));
        assert_eq!(image_dimensions(&png(640, 480)), Some((640, 480)));
        assert_eq!(image_dimensions(&encode(64, 48, ImageFormat::Jpeg)), Some((64, 48)));
        assert_eq!(image_dimensions(&encode(10, 20, ImageFormat::Bmp)), Some((10, 20)));
    }

    #[test]
    fn test_truncated_header_has_no_size() {
        // signature and IHDR length only, no chunk data
        let truncated = &PLACEHOLDER_PNG[..12];
        assert_eq!(sniff_format(truncated), Some(("image/png", "png")));
        assert_eq!(image_dimensions(truncated), None);
        assert_eq!(image_dimensions(b"plain"), None);
    }

    #[test]
    fn test_extension_follows_declared_mime() {
        assert_eq!(extension_for_mime("image/png", None), "png");
        assert_eq!(extension_for_mime("image/x-emf", None), "emf");
        assert_eq!(extension_for_mime("application/x-thing", Some(("image/gif", "gif"))), "gif");
        assert_eq!(extension_for_mime("application/x-thing", None), "bin");
    }

    #[test]
    fn test_shared_binary_distinct_owner_rels() {
        let images = ImageDb::new().with_image("logo", ImageData::new(png(10, 10)));
        let mut registry = RelationshipRegistry::new();
        let mut warnings = Warnings::new();
        let doc = well_known::document();
        let notes = well_known::footnotes();
        let mut store = MediaStore::new([]);

        let a = store.register(&mut registry, &doc, "logo", &images, &mut warnings);
        let b = store.register(&mut registry, &doc, "logo", &images, &mut warnings);
        let c = store.register(&mut registry, &notes, "logo", &images, &mut warnings);

        assert_eq!(a, b);
        assert_eq!(c, "rId1");
        assert_eq!(store.parts().count(), 1);
        assert_eq!(store.part("logo").unwrap().size, Some((10, 10)));
        assert_eq!(registry.resolve(&doc, &a).unwrap().target, "media/image1.png");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let mut registry = RelationshipRegistry::new();
        let mut warnings = Warnings::new();
        let doc = well_known::document();
        let mut store = MediaStore::new([]);

        store.register(&mut registry, &doc, "nope", &ImageDb::new(), &mut warnings);

        let part = store.part("nope").unwrap();
        assert!(part.placeholder);
        assert_eq!(part.data, PLACEHOLDER_PNG);
        assert_eq!(warnings.count(WarningKind::MissingImage), 1);
    }

    #[test]
    fn test_avoids_existing_media_paths() {
        let existing = PartUri::new("/word/media/image1.png").unwrap();
        let images = ImageDb::new().with_image("a", ImageData::new(png(1, 1)));
        let mut store = MediaStore::new([&existing]);
        let mut registry = RelationshipRegistry::new();

        store.register(
            &mut registry,
            &well_known::document(),
            "a",
            &images,
            &mut Warnings::new(),
        );
        assert_eq!(store.part("a").unwrap().uri.as_str(), "/word/media/image2.png");
    }

    #[test]
    fn test_display_size_scaling() {
        let image = ImageRef::new("x");
        assert_eq!(display_size(&image, Some((1248, 400)), (320, 240), 624), (624, 200));
        assert_eq!(display_size(&image, None, (320, 240), 624), (320, 240));

        let mut sized = ImageRef::new("x");
        sized.width = Some(100);
        assert_eq!(display_size(&sized, Some((200, 50)), (320, 240), 624), (100, 25));
    }
}

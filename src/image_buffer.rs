//! # Image Buffer Module
//!
//! The transient payload handed in and out of the compression pipeline.
//! Bytes are shared behind an `Arc` so a buffer can cross into a blocking
//! codec stage, or be kept around as a fallback, without copying.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub const MEDIA_TYPE_JPEG: &str = "image/jpeg";
pub const MEDIA_TYPE_PNG: &str = "image/png";
pub const MEDIA_TYPE_WEBP: &str = "image/webp";

/// An opaque image payload with its display name and media type tag
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Arc<[u8]>,
    name: String,
    media_type: String,
}

impl ImageBuffer {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        name: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            name: name.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the payload, cheap to clone.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Same name and media type, new payload.
    pub fn with_bytes(&self, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            name: self.name.clone(),
            media_type: self.media_type.clone(),
        }
    }

    /// True when both buffers point at the very same payload allocation.
    pub fn shares_payload_with(&self, other: &ImageBuffer) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Media type for a file name, from its extension
pub fn media_type_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(MEDIA_TYPE_JPEG),
        "png" => Some(MEDIA_TYPE_PNG),
        "webp" => Some(MEDIA_TYPE_WEBP),
        _ => None,
    }
}

/// Media type sniffed from the payload's magic bytes
pub fn media_type_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Jpeg => Some(MEDIA_TYPE_JPEG),
        image::ImageFormat::Png => Some(MEDIA_TYPE_PNG),
        image::ImageFormat::WebP => Some(MEDIA_TYPE_WEBP),
        _ => None,
    }
}

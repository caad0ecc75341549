//! # Image Codec Module
//!
//! Thin adapter over the platform image codec. The compressor only talks to
//! the [`ImageCodec`] trait, so tests can inject spies or engineered
//! failures, and the default [`RasterCodec`] does the real work on the
//! `image` crate.
//!
//! ## Stadi:
//! - `decode`: bytes -> raster (fallisce con `Decode`)
//! - `draw`: raster -> superficie alle dimensioni target (fallisce con `Draw`)
//! - `encode`: superficie -> bytes nel media type originale (fallisce con `Encode`)

use crate::error::{CompressError, Result};
use crate::image_buffer::{MEDIA_TYPE_JPEG, MEDIA_TYPE_PNG, MEDIA_TYPE_WEBP};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder};

/// Largest drawing surface the default codec will allocate (16384 x 16384)
pub const MAX_SURFACE_PIXELS: u64 = 268_435_456;

/// Width and height of a raster or drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Decode / draw / encode primitives used by the compressor.
///
/// Every method is blocking and CPU-bound; the compressor moves calls onto
/// the blocking pool.
pub trait ImageCodec: Send + Sync + 'static {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    fn draw(&self, image: DynamicImage, target: Dimensions) -> Result<DynamicImage>;

    /// `quality` is whatever the caller configured, boundaries 0 and 1 included.
    fn encode(&self, surface: &DynamicImage, media_type: &str, quality: f32) -> Result<Vec<u8>>;
}

/// Default codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        Self
    }

    /// Maps a 0.0-1.0 quality onto the JPEG encoder's 1-100 scale.
    pub fn jpeg_quality(quality: f32) -> u8 {
        let scaled = (quality * 100.0).round();
        if scaled.is_nan() {
            return 1;
        }
        scaled.clamp(1.0, 100.0) as u8
    }

    fn encode_jpeg(surface: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
        // JPEG has no alpha channel
        let rgb = surface.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, Self::jpeg_quality(quality));
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| CompressError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn encode_png(surface: &DynamicImage) -> Result<Vec<u8>> {
        let rgba = surface.to_rgba8();
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| CompressError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn encode_webp(surface: &DynamicImage) -> Result<Vec<u8>> {
        let rgba = surface.to_rgba8();
        let mut buf = Vec::new();
        WebPEncoder::new_lossless(&mut buf)
            .encode(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
            .map_err(|e| CompressError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

impl ImageCodec for RasterCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(CompressError::Decode("empty buffer".to_string()));
        }
        image::load_from_memory(bytes).map_err(|e| CompressError::Decode(e.to_string()))
    }

    fn draw(&self, image: DynamicImage, target: Dimensions) -> Result<DynamicImage> {
        if target.width == 0 || target.height == 0 {
            return Err(CompressError::Draw(format!(
                "invalid surface size {}x{}",
                target.width, target.height
            )));
        }
        if target.pixel_count() > MAX_SURFACE_PIXELS {
            return Err(CompressError::Draw(format!(
                "surface {}x{} exceeds {} pixels",
                target.width, target.height, MAX_SURFACE_PIXELS
            )));
        }

        if Dimensions::of(&image) == target {
            return Ok(image);
        }
        Ok(image.resize_exact(target.width, target.height, FilterType::Lanczos3))
    }

    fn encode(&self, surface: &DynamicImage, media_type: &str, quality: f32) -> Result<Vec<u8>> {
        match media_type.to_lowercase().as_str() {
            MEDIA_TYPE_JPEG | "image/jpg" => Self::encode_jpeg(surface, quality),
            // Lossless encoders, quality does not apply
            MEDIA_TYPE_PNG => Self::encode_png(surface),
            MEDIA_TYPE_WEBP => Self::encode_webp(surface),
            other => Err(CompressError::Encode(format!("unsupported media type: {}", other))),
        }
    }
}

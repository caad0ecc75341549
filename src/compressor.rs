//! # Image Compressor Module
//!
//! Questo modulo contiene il cuore della pipeline: una singola compressione.
//!
//! ## Flusso:
//! 1. Decode del buffer in un raster (dimensioni note dopo il decode)
//! 2. Calcolo delle dimensioni target, solo riduzione, aspect ratio invariato
//! 3. Draw del raster sulla superficie target
//! 4. Evento di progresso al 50% (dimensione compressa ancora ignota, quindi 0)
//! 5. Encode nel media type originale alla qualità configurata
//! 6. Nuovo `ImageBuffer` con stesso nome e media type
//! 7. Evento di progresso al 100% con i valori reali
//!
//! ## Punti di sospensione:
//! Decode+draw e encode girano ciascuno in un `spawn_blocking` separato, così
//! il runtime resta libero durante il lavoro CPU-bound. Nessuna superficie o
//! decoder è condiviso tra compressioni concorrenti.

use crate::codec::{Dimensions, ImageCodec, RasterCodec};
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};
use crate::image_buffer::ImageBuffer;
use crate::utils::compression_ratio_percent;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Snapshot emitted while one image is being compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionProgress {
    pub progress: u8,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub compression_ratio_percent: i64,
}

impl CompressionProgress {
    /// Mid-point event: decoded and drawn, nothing encoded yet.
    pub fn drawn(original_size_bytes: u64) -> Self {
        Self {
            progress: 50,
            original_size_bytes,
            compressed_size_bytes: 0,
            compression_ratio_percent: 0,
        }
    }

    pub fn finished(original_size_bytes: u64, compressed_size_bytes: u64) -> Self {
        Self {
            progress: 100,
            original_size_bytes,
            compressed_size_bytes,
            compression_ratio_percent: compression_ratio_percent(
                original_size_bytes,
                compressed_size_bytes,
            ),
        }
    }
}

/// Callback receiving the two progress events of one compression
pub type ProgressFn<'a> = &'a (dyn Fn(CompressionProgress) + Send + Sync);

/// Scale-down-only target size that preserves the aspect ratio.
///
/// Images already within both bounds keep their dimensions. Otherwise both
/// sides are multiplied by `min(max_width / width, max_height / height)`.
pub fn target_dimensions(source: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    if source.width <= max_width && source.height <= max_height {
        return source;
    }

    let ratio = f64::min(
        max_width as f64 / source.width as f64,
        max_height as f64 / source.height as f64,
    );
    let width = ((source.width as f64 * ratio).round() as u32).max(1);
    let height = ((source.height as f64 * ratio).round() as u32).max(1);
    Dimensions::new(width, height)
}

/// Compresses one image buffer at a time
pub struct ImageCompressor<C = RasterCodec> {
    codec: Arc<C>,
}

impl<C> Clone for ImageCompressor<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl Default for ImageCompressor<RasterCodec> {
    fn default() -> Self {
        Self::new(RasterCodec::new())
    }
}

impl<C: ImageCodec> ImageCompressor<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Resize and re-encode `input` according to `config`.
    ///
    /// Fails with `Decode`, `Draw` or `Encode` depending on the stage; the
    /// error is never recovered from here.
    pub async fn compress(
        &self,
        input: &ImageBuffer,
        config: &CompressionConfig,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<ImageBuffer> {
        let original_size = input.size_bytes();
        let (max_width, max_height) = (config.max_width, config.max_height);

        let codec = Arc::clone(&self.codec);
        let bytes = input.shared_bytes();
        let surface = tokio::task::spawn_blocking(move || {
            let decoded = codec.decode(&bytes)?;
            let source = Dimensions::of(&decoded);
            let target = target_dimensions(source, max_width, max_height);
            debug!(
                "Decoded {}x{}, drawing at {}x{}",
                source.width, source.height, target.width, target.height
            );
            codec.draw(decoded, target)
        })
        .await
        .map_err(|e| CompressError::Decode(format!("decode task failed: {}", e)))??;

        if let Some(report) = on_progress {
            report(CompressionProgress::drawn(original_size));
        }

        let codec = Arc::clone(&self.codec);
        let media_type = input.media_type().to_string();
        let quality = config.quality;
        let encoded =
            tokio::task::spawn_blocking(move || codec.encode(&surface, &media_type, quality))
                .await
                .map_err(|e| CompressError::Encode(format!("encode task failed: {}", e)))??;

        if encoded.is_empty() {
            return Err(CompressError::Encode("encoder returned no data".to_string()));
        }

        let output = input.with_bytes(encoded);
        if let Some(report) = on_progress {
            report(CompressionProgress::finished(original_size, output.size_bytes()));
        }

        debug!(
            "Compressed {}: {} -> {} bytes",
            input.name(),
            original_size,
            output.size_bytes()
        );
        Ok(output)
    }
}

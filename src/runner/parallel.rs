//! # Parallel Runner Module
//!
//! Unbounded fan-out for small batches: every input gets its own
//! compression future, all polled together, and the first failure fails
//! the whole call.

use crate::codec::{ImageCodec, RasterCodec};
use crate::compressor::{CompressionProgress, ImageCompressor};
use crate::config::CompressionConfig;
use crate::error::Result;
use crate::image_buffer::ImageBuffer;
use futures::future::try_join_all;
use tracing::debug;

/// Callback receiving `(input index, progress)` for every compression event
pub type IndexedProgressFn<'a> = &'a (dyn Fn(usize, CompressionProgress) + Send + Sync);

/// All-or-nothing runner with no concurrency ceiling
pub struct ParallelRunner<C = RasterCodec> {
    compressor: ImageCompressor<C>,
}

impl<C> Clone for ParallelRunner<C> {
    fn clone(&self) -> Self {
        Self {
            compressor: self.compressor.clone(),
        }
    }
}

impl Default for ParallelRunner<RasterCodec> {
    fn default() -> Self {
        Self::new(ImageCompressor::default())
    }
}

impl<C: ImageCodec> ParallelRunner<C> {
    pub fn new(compressor: ImageCompressor<C>) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &ImageCompressor<C> {
        &self.compressor
    }

    /// Compress every input concurrently.
    ///
    /// Output order matches input order. Any single failure is returned and
    /// the remaining compressions are dropped; no partial result survives.
    pub async fn compress_all(
        &self,
        inputs: &[ImageBuffer],
        config: &CompressionConfig,
        on_progress: Option<IndexedProgressFn<'_>>,
    ) -> Result<Vec<ImageBuffer>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Compressing {} images in parallel", inputs.len());

        let tasks = inputs.iter().enumerate().map(|(index, input)| async move {
            match on_progress {
                Some(report) => {
                    let tagged = move |progress: CompressionProgress| report(index, progress);
                    self.compressor.compress(input, config, Some(&tagged)).await
                }
                None => self.compressor.compress(input, config, None).await,
            }
        });

        try_join_all(tasks).await
    }
}

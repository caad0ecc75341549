//! # Bounded Batch Runner Module
//!
//! Runner per invii multi-file: al massimo `concurrency` compressioni attive,
//! e un file che fallisce non fa mai fallire il batch.
//!
//! ## Policy di fallimento:
//! - Decode, draw ed encode vengono gestiti allo stesso modo
//! - Si logga un warning con il nome del file
//! - Nello slot di output finisce il buffer originale, non compresso
//!
//! ## Scheduling:
//! - `Scheduling::Permits`: semaforo con `concurrency` permessi, uno slot si
//!   libera appena un file termina
//! - `Scheduling::Waves`: finestre consecutive di `concurrency` file, la
//!   finestra N+1 parte solo quando la N è completamente conclusa
//!
//! ## Progresso:
//! Dopo ogni file (compresso o sostituito) il contatore condiviso viene
//! incrementato e il callback riceve `(completati, totale, nome file)`.

use crate::codec::{ImageCodec, RasterCodec};
use crate::compressor::ImageCompressor;
use crate::config::{BatchOptions, CompressionConfig, Scheduling};
use crate::error::{CompressError, Result};
use crate::image_buffer::ImageBuffer;
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Emitted once per settled item, success or fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgressEvent {
    pub completed_count: usize,
    pub total_count: usize,
    pub current_file_name: String,
}

/// Callback receiving one event per settled item
pub type BatchProgressFn<'a> = &'a (dyn Fn(&BatchProgressEvent) + Send + Sync);

/// Runner with a concurrency ceiling and per-item fallback to the original
pub struct BoundedBatchRunner<C = RasterCodec> {
    compressor: ImageCompressor<C>,
}

impl<C> Clone for BoundedBatchRunner<C> {
    fn clone(&self) -> Self {
        Self {
            compressor: self.compressor.clone(),
        }
    }
}

impl Default for BoundedBatchRunner<RasterCodec> {
    fn default() -> Self {
        Self::new(ImageCompressor::default())
    }
}

impl<C: ImageCodec> BoundedBatchRunner<C> {
    pub fn new(compressor: ImageCompressor<C>) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &ImageCompressor<C> {
        &self.compressor
    }

    /// Compress `inputs` with at most `options.concurrency` items in flight.
    ///
    /// The result always has the same length and order as `inputs`. Only a
    /// zero concurrency is rejected; per-item failures never are.
    pub async fn compress_batch(
        &self,
        inputs: &[ImageBuffer],
        config: &CompressionConfig,
        options: &BatchOptions,
        on_progress: Option<BatchProgressFn<'_>>,
    ) -> Result<Vec<ImageBuffer>> {
        if options.concurrency == 0 {
            return Err(CompressError::InvalidConcurrency(options.concurrency));
        }
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let total = inputs.len();
        let concurrency = options.concurrency.min(total);
        let completed = AtomicUsize::new(0);
        let mut slots: Vec<Option<ImageBuffer>> = vec![None; total];

        debug!(
            "Compressing {} images, concurrency {}, {:?} scheduling",
            total, concurrency, options.scheduling
        );

        let settle = |index: usize, input: &ImageBuffer, output: ImageBuffer| {
            let completed_count = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(report) = on_progress {
                report(&BatchProgressEvent {
                    completed_count,
                    total_count: total,
                    current_file_name: input.name().to_string(),
                });
            }
            (index, output)
        };

        match options.scheduling {
            Scheduling::Permits => {
                let semaphore = Semaphore::new(concurrency);
                let tasks = inputs.iter().enumerate().map(|(index, input)| {
                    let semaphore = &semaphore;
                    let settle = &settle;
                    async move {
                        // Never closed, acquire cannot fail
                        let _permit = semaphore.acquire().await.ok();
                        let output = self
                            .compress_or_fallback(input, config, options.item_timeout)
                            .await;
                        settle(index, input, output)
                    }
                });

                for (index, output) in join_all(tasks).await {
                    slots[index] = Some(output);
                }
            }
            Scheduling::Waves => {
                for (window, items) in inputs.chunks(concurrency).enumerate() {
                    let offset = window * concurrency;
                    let tasks = items.iter().enumerate().map(|(i, input)| {
                        let settle = &settle;
                        async move {
                            let output = self
                                .compress_or_fallback(input, config, options.item_timeout)
                                .await;
                            settle(offset + i, input, output)
                        }
                    });

                    for (index, output) in join_all(tasks).await {
                        slots[index] = Some(output);
                    }
                    debug!("Window {} settled", window);
                }
            }
        }

        let outputs: Vec<ImageBuffer> = slots.into_iter().flatten().collect();
        debug_assert_eq!(outputs.len(), total);
        Ok(outputs)
    }

    async fn compress_or_fallback(
        &self,
        input: &ImageBuffer,
        config: &CompressionConfig,
        timeout: Option<Duration>,
    ) -> ImageBuffer {
        let attempt = self.compressor.compress(input, config, None);
        tokio::pin!(attempt);

        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt.as_mut()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        "Compression of {} timed out after {:?}, using original",
                        input.name(),
                        limit
                    );
                    // A blocking codec stage cannot be cancelled: hold the
                    // slot until it returns, then discard its result.
                    let _ = attempt.await;
                    return input.clone();
                }
            },
            None => attempt.await,
        };

        match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Compression of {} failed, using original: {}", input.name(), e);
                input.clone()
            }
        }
    }
}

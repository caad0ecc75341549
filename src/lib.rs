//! # Upload Image Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della pipeline di compressione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per il form di upload
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione di compressione, batch e CLI
//! - `error`: Tipi di errore per i tre stadi di compressione
//! - `image_buffer`: Payload in ingresso/uscita con nome e media type
//! - `utils`: Formattazione dimensioni e predicato di compressione
//! - `codec`: Adapter decode/draw/encode sopra il crate `image`
//! - `compressor`: Compressione di una singola immagine
//! - `runner`: Runner parallelo e runner a concorrenza limitata
//! - `pipeline`: Orchestratore del flusso di upload usato dalla CLI
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use upload_image_compressor::{BatchOptions, BoundedBatchRunner, CompressionConfig, ImageBuffer};
//!
//! # async fn demo(inputs: Vec<ImageBuffer>) -> upload_image_compressor::Result<()> {
//! let runner = BoundedBatchRunner::default();
//! let outputs = runner
//!     .compress_batch(&inputs, &CompressionConfig::default(), &BatchOptions::new(3), None)
//!     .await?;
//! assert_eq!(outputs.len(), inputs.len());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_buffer;
pub mod json_output;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use codec::{Dimensions, ImageCodec, RasterCodec};
pub use compressor::{CompressionProgress, ImageCompressor};
pub use config::{BatchOptions, CompressionConfig, Config, Scheduling};
pub use error::{CompressError, Result};
pub use image_buffer::ImageBuffer;
pub use pipeline::UploadPipeline;
pub use runner::{BatchProgressEvent, BoundedBatchRunner, ParallelRunner};
pub use utils::{format_file_size, should_compress};

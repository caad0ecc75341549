//! # Runner Module
//!
//! Orchestratori batch sopra `ImageCompressor`, separati per policy:
//! - `parallel`: un task per file, nessun limite, tutto-o-niente
//! - `bounded`: limite di concorrenza, fallback all'originale per singolo file
//!
//! Entrambi restituiscono una lista con stessa lunghezza e stesso ordine
//! dell'input, indipendentemente dall'ordine di completamento.

pub mod bounded;
pub mod parallel;

pub use bounded::{BatchProgressEvent, BatchProgressFn, BoundedBatchRunner};
pub use parallel::{IndexedProgressFn, ParallelRunner};

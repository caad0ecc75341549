//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore della pipeline di compressione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` per categorizzare i fallimenti di una compressione
//! - Distingue i tre stadi per-immagine (decode, draw, encode) dagli errori del chiamante
//! - Integra con `thiserror` per messaggi e conversioni automatiche
//!
//! ## Categorie di errori:
//! - `Decode`: il buffer non è un'immagine leggibile
//! - `Draw`: impossibile disegnare sulla superficie di destinazione
//! - `Encode`: l'encoder non ha prodotto dati
//! - `InvalidConcurrency` / `InvalidConfig`: errori di programmazione del chiamante
//! - `Io`: errori di I/O (solo CLI e file manager)
//!
//! ## Esempio:
//! ```rust
//! use upload_image_compressor::CompressError;
//!
//! let err = CompressError::Encode("encoder returned no data".to_string());
//! assert!(err.is_compression_failure());
//! ```

/// Custom error types for image compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Failed to load image: {0}")]
    Decode(String),

    #[error("Failed to draw image: {0}")]
    Draw(String),

    #[error("Failed to compress image: {0}")]
    Encode(String),

    #[error("Invalid concurrency: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid compression config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompressError {
    /// True for the per-image failures the bounded runner recovers from.
    pub fn is_compression_failure(&self) -> bool {
        matches!(
            self,
            CompressError::Decode(_) | CompressError::Draw(_) | CompressError::Encode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;

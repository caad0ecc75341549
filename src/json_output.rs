//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per il flusso di upload.
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout
//! - Riusa gli eventi di progresso della pipeline così come sono
//! - Aggiunge il digest SHA-256 di ogni file scritto, per verificare l'upload
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_progress`: Evento 50%/100% di una singola compressione (runner parallelo)
//! - `batch_progress`: File completato (runner limitato)
//! - `file_complete`: File scritto nella directory di output
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore durante elaborazione

use crate::compressor::CompressionProgress;
use crate::config::{CompressionConfig, RunnerMode};
use crate::progress::UploadStats;
use crate::runner::BatchProgressEvent;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// How a file ended up in the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Compressed,
    PassedThrough,
    FellBack,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start {
        total_files: usize,
        to_compress: usize,
        mode: RunnerMode,
        compression: CompressionConfig,
    },

    /// Progresso di una singola compressione
    FileProgress {
        index: usize,
        #[serde(flatten)]
        progress: CompressionProgress,
    },

    /// File completato dal runner limitato
    BatchProgress {
        #[serde(flatten)]
        event: BatchProgressEvent,
    },

    /// File scritto su disco
    FileComplete {
        name: String,
        path: PathBuf,
        original_size: u64,
        output_size: u64,
        outcome: FileOutcome,
        sha256: String,
    },

    /// Batch completato
    Complete {
        files_processed: usize,
        files_compressed: usize,
        files_passed_through: usize,
        files_fell_back: usize,
        total_original_size: u64,
        total_output_size: u64,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Crea un messaggio di completamento file
    pub fn file_complete(
        name: &str,
        path: PathBuf,
        original_size: u64,
        bytes: &[u8],
        outcome: FileOutcome,
    ) -> Self {
        Self::FileComplete {
            name: name.to_string(),
            path,
            original_size,
            output_size: bytes.len() as u64,
            outcome,
            sha256: sha256_hex(bytes),
        }
    }

    /// Crea un messaggio di completamento generale
    pub fn complete(stats: &UploadStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_compressed: stats.files_compressed,
            files_passed_through: stats.files_passed_through,
            files_fell_back: stats.files_fell_back,
            total_original_size: stats.total_original_size,
            total_output_size: stats.total_output_size,
            duration_seconds,
        }
    }

    /// Crea un messaggio di errore
    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

/// Hex-encoded SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_batch_progress_is_flattened() {
        let message = JsonMessage::BatchProgress {
            event: BatchProgressEvent {
                completed_count: 2,
                total_count: 5,
                current_file_name: "pho.jpg".to_string(),
            },
        };
        let value: Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "batch_progress");
        assert_eq!(value["completedCount"], 2);
        assert_eq!(value["totalCount"], 5);
        assert_eq!(value["currentFileName"], "pho.jpg");
    }

    #[test]
    fn test_file_progress_carries_index() {
        let message = JsonMessage::FileProgress {
            index: 3,
            progress: CompressionProgress::drawn(1000),
        };
        let value: Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "file_progress");
        assert_eq!(value["index"], 3);
        assert_eq!(value["progress"], 50);
        assert_eq!(value["compressedSizeBytes"], 0);
    }

    #[test]
    fn test_file_complete_message() {
        let message = JsonMessage::file_complete(
            "a.png",
            PathBuf::from("out/a.png"),
            10,
            b"abc",
            FileOutcome::FellBack,
        );
        let value: Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "file_complete");
        assert_eq!(value["outcome"], "fell_back");
        assert_eq!(value["output_size"], 3);
        assert_eq!(value["sha256"].as_str().unwrap().len(), 64);
    }
}

//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar della CLI e le statistiche del batch.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif`, avanzata dal callback del runner
//! - `UploadStats`: contatori e byte totali per il riepilogo finale
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================================] 12/12 (100%) pasta.jpg
//! ```

use crate::utils::{compression_ratio_percent, format_file_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for a batch of uploads
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing, for JSON mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Move the bar to `position` with a message
    pub fn set_position(&self, position: u64, message: &str) {
        self.bar.set_position(position);
        self.bar.set_message(message.to_string());
    }

    /// Advance by one with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Statistics for one upload run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadStats {
    pub files_processed: usize,
    /// Re-encoded by the compressor
    pub files_compressed: usize,
    /// At or below the threshold, uploaded untouched
    pub files_passed_through: usize,
    /// Compression failed, original uploaded instead
    pub files_fell_back: usize,
    pub total_original_size: u64,
    pub total_output_size: u64,
}

impl UploadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_compressed(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_compressed += 1;
        self.total_original_size += original_size;
        self.total_output_size += new_size;
    }

    pub fn add_passed_through(&mut self, size: u64) {
        self.files_processed += 1;
        self.files_passed_through += 1;
        self.total_original_size += size;
        self.total_output_size += size;
    }

    pub fn add_fallback(&mut self, size: u64) {
        self.files_processed += 1;
        self.files_fell_back += 1;
        self.total_original_size += size;
        self.total_output_size += size;
    }

    pub fn bytes_saved(&self) -> i64 {
        self.total_original_size as i64 - self.total_output_size as i64
    }

    pub fn overall_ratio_percent(&self) -> i64 {
        compression_ratio_percent(self.total_original_size, self.total_output_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Compressed: {} | Passed through: {} | Fell back: {} | {} -> {} ({}%)",
            self.files_processed,
            self.files_compressed,
            self.files_passed_through,
            self.files_fell_back,
            format_file_size(self.total_original_size),
            format_file_size(self.total_output_size),
            self.overall_ratio_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_stats_totals() {
        let mut stats = UploadStats::new();
        stats.add_compressed(4096, 1024);
        stats.add_passed_through(1024);
        stats.add_fallback(3072);

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_compressed, 1);
        assert_eq!(stats.files_passed_through, 1);
        assert_eq!(stats.files_fell_back, 1);
        assert_eq!(stats.total_original_size, 8192);
        assert_eq!(stats.total_output_size, 5120);
        assert_eq!(stats.bytes_saved(), 3072);
        assert_eq!(stats.overall_ratio_percent(), 38);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = UploadStats::new();
        stats.add_compressed(2048, 1024);
        assert_eq!(
            stats.format_summary(),
            "Processed: 1 files | Compressed: 1 | Passed through: 0 | Fell back: 0 | 2 KB -> 1 KB (50%)"
        );
    }

    #[test]
    fn test_hidden_progress_tracks_position() {
        let progress = ProgressManager::hidden();
        progress.set_position(3, "c.jpg");
        progress.update("d.jpg");
        assert_eq!(progress.position(), 4);
    }
}

//! # Utility Functions Module
//!
//! Small pure helpers shared by the compressor, the runners and the CLI
//! summary: human-readable sizes, the compress-or-not predicate and the
//! compression ratio.

use crate::image_buffer::ImageBuffer;

/// Default threshold above which a buffer is worth compressing.
pub const DEFAULT_THRESHOLD_KB: u64 = 500;

const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

/// Formats a byte count as a human-readable magnitude.
///
/// The unit is `floor(log1024(bytes))` clamped to GB, and the value is
/// rounded to at most two decimals with trailing zeros dropped.
///
/// # Example
/// ```rust
/// use upload_image_compressor::utils::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    // Integer walk gives an exact floor(log1024) without float drift.
    let mut unit_index = 0;
    let mut divisor: u64 = 1;
    while unit_index < UNITS.len() - 1 && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit_index += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit_index])
}

/// True iff the buffer is strictly larger than `threshold_kb` kibibytes.
pub fn should_compress(buffer: &ImageBuffer, threshold_kb: u64) -> bool {
    buffer.size_bytes() > threshold_kb.saturating_mul(1024)
}

/// `round((1 - compressed / original) * 100)`, negative when the output grew.
pub fn compression_ratio_percent(original_size: u64, compressed_size: u64) -> i64 {
    if original_size == 0 {
        return 0;
    }
    ((1.0 - compressed_size as f64 / original_size as f64) * 100.0).round() as i64
}

//! # Upload Pipeline Module
//!
//! Orchestratore usato dalla CLI, l'equivalente del form di upload.
//!
//! ## Flusso:
//! 1. Legge i file in `ImageBuffer`
//! 2. Sceglie con `should_compress` quali file superano la soglia
//! 3. Passa quelli al runner configurato (limitato o parallelo)
//! 4. Rimette ogni output nella posizione del suo input
//! 5. Scrive i file nella directory di output e produce le statistiche

use crate::compressor::CompressionProgress;
use crate::config::{Config, RunnerMode};
use crate::file_manager::{FileManager, InputFile};
use crate::image_buffer::ImageBuffer;
use crate::json_output::{FileOutcome, JsonMessage};
use crate::progress::{ProgressManager, UploadStats};
use crate::runner::{BatchProgressEvent, BoundedBatchRunner, ParallelRunner};
use crate::utils::{format_file_size, should_compress};
use anyhow::Result;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Main upload orchestrator
pub struct UploadPipeline {
    config: Config,
    output_dir: PathBuf,
}

impl UploadPipeline {
    /// Create a new pipeline writing into `output_dir`
    pub fn new(config: Config, output_dir: PathBuf) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Compress and write every file, returning the run statistics
    pub async fn run(&self, files: &[InputFile]) -> Result<UploadStats> {
        let start_time = Instant::now();
        let inputs =
            try_join_all(files.iter().map(|file| FileManager::read_image(&file.path))).await?;

        let is_selected: Vec<bool> = inputs
            .iter()
            .map(|input| should_compress(input, self.config.threshold_kb))
            .collect();
        let selected: Vec<usize> = (0..inputs.len()).filter(|&i| is_selected[i]).collect();
        let to_compress: Vec<ImageBuffer> = selected.iter().map(|&i| inputs[i].clone()).collect();

        info!(
            "Found {} images, {} above {} KB will be compressed ({:?} runner)",
            inputs.len(),
            to_compress.len(),
            self.config.threshold_kb,
            self.config.mode
        );

        if self.config.json_output {
            JsonMessage::Start {
                total_files: inputs.len(),
                to_compress: to_compress.len(),
                mode: self.config.mode,
                compression: self.config.compression,
            }
            .emit();
        }

        let progress = if self.config.json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(to_compress.len() as u64)
        };

        let compressed = self.compress(&to_compress, &progress).await?;

        let mut outputs = inputs.clone();
        for (slot, output) in selected.iter().zip(compressed) {
            outputs[*slot] = output;
        }

        let mut stats = UploadStats::new();
        for (index, (input, output)) in inputs.iter().zip(&outputs).enumerate() {
            let outcome = if !is_selected[index] {
                stats.add_passed_through(input.size_bytes());
                FileOutcome::PassedThrough
            } else if output.shares_payload_with(input) {
                stats.add_fallback(input.size_bytes());
                FileOutcome::FellBack
            } else {
                stats.add_compressed(input.size_bytes(), output.size_bytes());
                FileOutcome::Compressed
            };

            let path =
                FileManager::write_image(output, &self.output_dir, &files[index].relative_path)
                    .await?;
            debug!(
                "Wrote {} ({} -> {}, {:?})",
                path.display(),
                format_file_size(input.size_bytes()),
                format_file_size(output.size_bytes()),
                outcome
            );

            if self.config.json_output {
                JsonMessage::file_complete(
                    output.name(),
                    path,
                    input.size_bytes(),
                    output.bytes(),
                    outcome,
                )
                .emit();
            }
        }

        progress.finish(&stats.format_summary());
        self.print_final_stats(&stats);

        if self.config.json_output {
            JsonMessage::complete(&stats, start_time.elapsed().as_secs_f64()).emit();
        }

        Ok(stats)
    }

    async fn compress(
        &self,
        to_compress: &[ImageBuffer],
        progress: &ProgressManager,
    ) -> Result<Vec<ImageBuffer>> {
        let json_output = self.config.json_output;

        match self.config.mode {
            RunnerMode::Bounded => {
                let report = |event: &BatchProgressEvent| {
                    progress.set_position(event.completed_count as u64, &event.current_file_name);
                    if json_output {
                        JsonMessage::BatchProgress { event: event.clone() }.emit();
                    }
                };

                let outputs = BoundedBatchRunner::default()
                    .compress_batch(
                        to_compress,
                        &self.config.compression,
                        &self.config.batch_options(),
                        Some(&report),
                    )
                    .await?;
                Ok(outputs)
            }
            RunnerMode::Parallel => {
                let report = |index: usize, event: CompressionProgress| {
                    if event.progress == 100 {
                        progress.update(to_compress[index].name());
                    }
                    if json_output {
                        JsonMessage::FileProgress { index, progress: event }.emit();
                    }
                };

                let outputs = ParallelRunner::default()
                    .compress_all(to_compress, &self.config.compression, Some(&report))
                    .await
                    .map_err(|e| anyhow::anyhow!("Batch compression failed: {}", e))?;
                Ok(outputs)
            }
        }
    }

    fn print_final_stats(&self, stats: &UploadStats) {
        info!("=== Upload Preparation Complete ===");
        info!("Files processed: {}", stats.files_processed);
        info!("Files compressed: {}", stats.files_compressed);
        info!("Files passed through: {}", stats.files_passed_through);
        info!("Files uploaded uncompressed after failure: {}", stats.files_fell_back);
        info!(
            "Total size: {} -> {} ({}%)",
            format_file_size(stats.total_original_size),
            format_file_size(stats.total_output_size),
            stats.overall_ratio_percent()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Dimensions;
    use crate::config::CompressionConfig;
    use crate::test_support::png_bytes;
    use tempfile::TempDir;

    fn config(mode: RunnerMode) -> Config {
        Config {
            compression: CompressionConfig {
                max_width: 100,
                max_height: 100,
                ..Default::default()
            },
            threshold_kb: 2,
            mode,
            concurrency: 2,
            ..Default::default()
        }
    }

    fn write_inputs(dir: &Path) -> Vec<InputFile> {
        let large = dir.join("large.png");
        let small = dir.join("small.png");
        let broken = dir.join("broken.png");
        std::fs::write(&large, png_bytes(200, 150)).unwrap();
        std::fs::write(&small, png_bytes(4, 4)).unwrap();
        std::fs::write(&broken, vec![0x42u8; 4096]).unwrap();
        [large, small, broken]
            .into_iter()
            .map(|path| InputFile::standalone(path).unwrap())
            .collect()
    }

    fn pipeline(mode: RunnerMode, output_dir: PathBuf) -> UploadPipeline {
        UploadPipeline::new(config(mode), output_dir).unwrap()
    }

    #[tokio::test]
    async fn test_bounded_run_writes_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let files = write_inputs(temp_dir.path());
        let output_dir = temp_dir.path().join("out");

        let stats = pipeline(RunnerMode::Bounded, output_dir.clone()).run(&files).await.unwrap();

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_compressed, 1);
        assert_eq!(stats.files_passed_through, 1);
        assert_eq!(stats.files_fell_back, 1);

        let large = image::open(output_dir.join("large.png")).unwrap();
        assert_eq!(Dimensions::of(&large), Dimensions::new(100, 75));
        assert_eq!(
            std::fs::read(output_dir.join("small.png")).unwrap(),
            std::fs::read(&files[1].path).unwrap()
        );
        assert_eq!(
            std::fs::read(output_dir.join("broken.png")).unwrap(),
            std::fs::read(&files[2].path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_recursive_run_keeps_same_named_files_apart() {
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("shoot");
        for (dir, width) in [("a", 200), ("b", 160)] {
            std::fs::create_dir_all(input_dir.join(dir)).unwrap();
            std::fs::write(input_dir.join(dir).join("dish.png"), png_bytes(width, 120)).unwrap();
        }
        let output_dir = temp_dir.path().join("out");

        let files = FileManager::find_image_files(&[input_dir], true).unwrap();
        let stats = pipeline(RunnerMode::Bounded, output_dir.clone()).run(&files).await.unwrap();

        assert_eq!(stats.files_processed, 2);
        let first = image::open(output_dir.join("a").join("dish.png")).unwrap();
        let second = image::open(output_dir.join("b").join("dish.png")).unwrap();
        assert_eq!(Dimensions::of(&first), Dimensions::new(100, 60));
        assert_eq!(Dimensions::of(&second), Dimensions::new(100, 75));
    }

    #[tokio::test]
    async fn test_parallel_run_fails_on_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let files = write_inputs(temp_dir.path());

        let pipeline = pipeline(RunnerMode::Parallel, temp_dir.path().join("out"));
        assert!(pipeline.run(&files).await.is_err());
    }

    #[tokio::test]
    async fn test_parallel_run_without_failures() {
        let temp_dir = TempDir::new().unwrap();
        let files = write_inputs(temp_dir.path());

        let pipeline = pipeline(RunnerMode::Parallel, temp_dir.path().join("out"));
        let stats = pipeline.run(&files[..2]).await.unwrap();

        assert_eq!(stats.files_compressed, 1);
        assert_eq!(stats.files_passed_through, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut invalid = config(RunnerMode::Bounded);
        invalid.concurrency = 0;
        assert!(UploadPipeline::new(invalid, PathBuf::from("out")).is_err());
    }
}

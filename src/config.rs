//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione della pipeline di compressione.
//!
//! ## Responsabilità:
//! - Definisce `CompressionConfig`, il value object di una singola compressione
//! - Definisce `BatchOptions` per il runner a concorrenza limitata
//! - Definisce `Config`, la configurazione completa della CLI
//! - Supporta caricamento/salvataggio da/verso file JSON
//!
//! ## Parametri di compressione:
//! - `maxWidth`: Larghezza massima (default: 1920)
//! - `maxHeight`: Altezza massima (default: 1080)
//! - `quality`: Qualità encoder 0.0-1.0 (default: 0.85)
//! - `maxSizeKB`: Budget in KB, solo indicativo (default: 500)
//!
//! Le chiavi mancanti prendono il default, quelle sconosciute vengono ignorate.
//!
//! ## Esempio:
//! ```rust
//! use upload_image_compressor::CompressionConfig;
//!
//! let config: CompressionConfig = serde_json::from_str(r#"{"maxWidth": 800}"#).unwrap();
//! assert_eq!(config.max_width, 800);
//! assert_eq!(config.max_height, 1080);
//! ```

use crate::error::CompressError;
use crate::utils::DEFAULT_THRESHOLD_KB;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: f32 = 0.85;
pub const DEFAULT_MAX_SIZE_KB: u64 = 500;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tunable parameters governing one compression call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressionConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Passed to the encoder unmodified
    pub quality: f32,
    /// Advisory only, no re-encode loop enforces it
    #[serde(rename = "maxSizeKB")]
    pub max_size_kb: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            max_size_kb: DEFAULT_MAX_SIZE_KB,
        }
    }
}

impl CompressionConfig {
    /// Validate compression parameters
    pub fn validate(&self) -> std::result::Result<(), CompressError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressError::InvalidConfig(format!(
                "max dimensions must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }

        if !self.quality.is_finite() || !(0.0..=1.0).contains(&self.quality) {
            return Err(CompressError::InvalidConfig(format!(
                "quality must be between 0.0 and 1.0, got {}",
                self.quality
            )));
        }

        Ok(())
    }
}

/// How the bounded runner schedules items under its concurrency ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheduling {
    /// A slot frees up as soon as any in-flight item settles
    #[default]
    Permits,
    /// Consecutive windows of `concurrency` items, each awaited in full
    Waves,
}

/// Which runner the upload pipeline hands compressible files to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunnerMode {
    /// Bounded concurrency, original file substituted on failure
    #[default]
    Bounded,
    /// One task per file, any failure fails the batch
    Parallel,
}

/// Options for the bounded batch runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub scheduling: Scheduling,
    pub item_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            scheduling: Scheduling::default(),
            item_timeout: None,
        }
    }
}

impl BatchOptions {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    pub fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }
}

/// Configuration for the upload-compressor application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-image compression parameters
    pub compression: CompressionConfig,
    /// Files at or below this size (KB) are uploaded untouched
    pub threshold_kb: u64,
    /// Runner used for the files that need compression
    pub mode: RunnerMode,
    /// Concurrency ceiling of the bounded runner
    pub concurrency: usize,
    /// Scheduling strategy of the bounded runner
    pub scheduling: Scheduling,
    /// Optional per-item timeout of the bounded runner, in seconds
    pub item_timeout_secs: Option<u64>,
    /// Output directory for compressed files
    pub output_path: Option<PathBuf>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            threshold_kb: DEFAULT_THRESHOLD_KB,
            mode: RunnerMode::default(),
            concurrency: DEFAULT_CONCURRENCY,
            scheduling: Scheduling::default(),
            item_timeout_secs: None,
            output_path: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.compression
            .validate()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        if self.concurrency == 0 {
            return Err(anyhow::anyhow!("Concurrency must be greater than 0"));
        }

        if self.item_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Item timeout must be greater than 0 seconds"));
        }

        if let Some(ref output_path) = self.output_path {
            if output_path.exists() && !output_path.is_dir() {
                return Err(anyhow::anyhow!(
                    "Output path is not a directory: {}",
                    output_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Bounded runner options derived from this config
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.concurrency,
            scheduling: self.scheduling,
            item_timeout: self.item_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Default config file location, `<config dir>/upload-compressor/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("upload-compressor").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_compression_config_default() {
        let config = CompressionConfig::default();
        assert_eq!(config.max_width, 1920);
        assert_eq!(config.max_height, 1080);
        assert_eq!(config.quality, 0.85);
        assert_eq!(config.max_size_kb, 500);
    }

    #[test]
    fn test_compression_config_partial_json() {
        let json = r#"{"maxHeight": 600, "maxSizeKB": 200, "unknownKey": true}"#;
        let config: CompressionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_width, 1920);
        assert_eq!(config.max_height, 600);
        assert_eq!(config.quality, 0.85);
        assert_eq!(config.max_size_kb, 200);

        let empty: CompressionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CompressionConfig::default());
    }

    #[test]
    fn test_compression_config_validation() {
        let mut config = CompressionConfig::default();
        assert!(config.validate().is_ok());

        config.quality = 0.0;
        assert!(config.validate().is_ok());
        config.quality = 1.0;
        assert!(config.validate().is_ok());

        config.quality = 1.5;
        assert!(matches!(config.validate(), Err(CompressError::InvalidConfig(_))));
        config.quality = f32::NAN;
        assert!(config.validate().is_err());

        config.quality = 0.5;
        config.max_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.concurrency = 0;
        assert!(config.validate().is_err());

        config.concurrency = 2;
        config.item_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_options_from_config() {
        let config = Config {
            concurrency: 3,
            scheduling: Scheduling::Waves,
            item_timeout_secs: Some(30),
            ..Default::default()
        };
        let options = config.batch_options();
        assert_eq!(options.concurrency, 3);
        assert_eq!(options.scheduling, Scheduling::Waves);
        assert_eq!(options.item_timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            compression: CompressionConfig {
                max_width: 1280,
                max_height: 720,
                quality: 0.7,
                max_size_kb: 300,
            },
            threshold_kb: 250,
            mode: RunnerMode::Parallel,
            concurrency: 8,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.compression, original_config.compression);
        assert_eq!(loaded_config.threshold_kb, 250);
        assert_eq!(loaded_config.mode, RunnerMode::Parallel);
        assert_eq!(loaded_config.concurrency, 8);
    }

    #[test]
    fn test_config_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");

        let config = tokio_test::block_on(Config::from_file(&missing)).unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.threshold_kb, DEFAULT_THRESHOLD_KB);
    }
}

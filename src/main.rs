//! # Upload Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file JSON + override da CLI)
//! - Avvio della `UploadPipeline`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! upload-compressor ./menu-shoot --output ./ready --concurrency 3 --quality 0.8
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use upload_image_compressor::config::{RunnerMode, Scheduling};
use upload_image_compressor::file_manager::FileManager;
use upload_image_compressor::json_output::JsonMessage;
use upload_image_compressor::{Config, UploadPipeline};

#[derive(Parser)]
#[command(name = "upload-compressor")]
#[command(about = "Resize and re-encode photographs before upload")]
struct Args {
    /// Image files or directories to prepare for upload
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory for the prepared files
    #[arg(short, long)]
    output: PathBuf,

    /// Walk directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// JSON config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum output width in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Encoder quality (0.0-1.0)
    #[arg(short, long)]
    quality: Option<f32>,

    /// Advisory size budget in KB
    #[arg(long)]
    max_size_kb: Option<u64>,

    /// Files at or below this size (KB) are uploaded untouched
    #[arg(short, long)]
    threshold_kb: Option<u64>,

    /// Maximum number of concurrent compressions (bounded mode)
    #[arg(short = 'w', long)]
    concurrency: Option<usize>,

    /// Batch runner
    #[arg(long, value_enum)]
    mode: Option<RunnerMode>,

    /// Process fixed windows instead of freeing slots as items finish
    #[arg(long)]
    waves: bool,

    /// Per-file timeout in seconds (bounded mode)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output progress and status as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(max_width) = self.max_width {
            config.compression.max_width = max_width;
        }
        if let Some(max_height) = self.max_height {
            config.compression.max_height = max_height;
        }
        if let Some(quality) = self.quality {
            config.compression.quality = quality;
        }
        if let Some(max_size_kb) = self.max_size_kb {
            config.compression.max_size_kb = max_size_kb;
        }
        if let Some(threshold_kb) = self.threshold_kb {
            config.threshold_kb = threshold_kb;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.waves {
            config.scheduling = Scheduling::Waves;
        }
        if self.timeout_secs.is_some() {
            config.item_timeout_secs = self.timeout_secs;
        }
        if self.json {
            config.json_output = true;
        }
        config.output_path = Some(self.output.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for JSON output
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = run(&args).await;
    if let Err(ref e) = result {
        if args.json {
            JsonMessage::error("Upload preparation failed".to_string(), Some(e.to_string())).emit();
        }
    }
    result
}

async fn run(args: &Args) -> Result<()> {
    let mut config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::from_file(&path).await?,
        None => Config::default(),
    };
    args.apply_to(&mut config);

    let files = FileManager::find_image_files(&args.inputs, args.recursive)?;
    if files.is_empty() {
        info!("No image files found to process");
        return Ok(());
    }

    let pipeline = UploadPipeline::new(config, args.output.clone())?;
    pipeline.run(&files).await?;
    info!("Prepared files written to {}", pipeline.output_dir().display());

    Ok(())
}

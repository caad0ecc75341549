//! # File Management Module
//!
//! Questo modulo collega la pipeline in-memory al file system, solo per la CLI.
//!
//! ## Responsabilità:
//! - Discovery dei file immagine da path singoli o directory
//! - Lettura dei file in `ImageBuffer` (nome e media type inclusi)
//! - Scrittura degli output nella stessa struttura di directory dell'input
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, WebP
//!
//! ## Media type:
//! Dedotto dai magic bytes del contenuto, con fallback sull'estensione.

use crate::image_buffer::{media_type_from_bytes, media_type_from_path, ImageBuffer};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// An image found on disk and where it lands under the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Relative to the input root it was found under
    pub relative_path: PathBuf,
}

impl InputFile {
    pub fn new(path: PathBuf, relative_path: PathBuf) -> Self {
        Self { path, relative_path }
    }

    /// A file given directly, written under its own file name
    pub fn standalone(path: PathBuf) -> Result<Self> {
        let file_name: PathBuf = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?
            .into();
        Ok(Self::new(path, file_name))
    }
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Expand files and directories into the list of image files to process.
    ///
    /// Explicit file arguments are kept in the given order; directory
    /// contents are sorted by path. Hidden entries are skipped. Each file
    /// keeps its path relative to its input root, and two inputs mapping
    /// to the same output path are rejected.
    pub fn find_image_files(inputs: &[PathBuf], recursive: bool) -> Result<Vec<InputFile>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_file() {
                files.push(InputFile::standalone(input.clone())?);
                continue;
            }
            if !input.is_dir() {
                return Err(anyhow::anyhow!("Input does not exist: {}", input.display()));
            }

            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .max_depth(if recursive { usize::MAX } else { 1 })
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
                })
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && Self::is_image(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();

            for path in found {
                let relative_path = path.strip_prefix(input)?.to_path_buf();
                files.push(InputFile::new(path, relative_path));
            }
        }

        Self::ensure_unique_destinations(&files)?;
        Ok(files)
    }

    fn ensure_unique_destinations(files: &[InputFile]) -> Result<()> {
        let mut seen = HashSet::new();
        for file in files {
            if !seen.insert(&file.relative_path) {
                return Err(anyhow::anyhow!(
                    "Two inputs would be written to {}, the second is {}",
                    file.relative_path.display(),
                    file.path.display()
                ));
            }
        }
        Ok(())
    }

    /// Check if a file is a supported image
    pub fn is_image(path: &Path) -> bool {
        media_type_from_path(path).is_some()
    }

    /// Read a file into an `ImageBuffer` named after the file
    pub async fn read_image(path: &Path) -> Result<ImageBuffer> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

        let name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?
            .to_string_lossy()
            .into_owned();

        let media_type = media_type_from_bytes(&bytes)
            .or_else(|| media_type_from_path(path))
            .unwrap_or("application/octet-stream");

        Ok(ImageBuffer::new(bytes, name, media_type))
    }

    /// Write `buffer` to `relative_path` under `output_dir`
    pub async fn write_image(
        buffer: &ImageBuffer,
        output_dir: &Path,
        relative_path: &Path,
    ) -> Result<PathBuf> {
        let output_path = output_dir.join(relative_path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&output_path, buffer.bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", output_path.display(), e))?;
        Ok(output_path)
    }
}

//! File ingestion: paths in, `ProcessedFile`s out.
//!
//! Every failure that concerns a single file (too large, unreadable,
//! unsupported container) is recorded on that file so the batch continues.
//! Only input-set problems, such as too many files, abort.

pub mod image;
pub mod office;
pub mod pdf;
pub mod text;

use crate::domain::{FileType, Metadata, ProcessedFile};
use crate::utils::round_to;
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub struct Ingestor {
    max_file_size_bytes: u64,
}

impl Ingestor {
    pub fn new(max_file_size_bytes: u64) -> Self {
        Self { max_file_size_bytes }
    }

    pub fn process(&self, path: &Path) -> ProcessedFile {
        let file_type = FileType::from_path(path);
        let metadata = match file_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                return ProcessedFile::failed(
                    path.to_path_buf(),
                    file_type,
                    Metadata::new(),
                    format!("{:#}", e),
                )
            }
        };

        let size = metadata.get("file_size").and_then(|v| v.as_u64()).unwrap_or(0);
        if size > self.max_file_size_bytes {
            return ProcessedFile::failed(
                path.to_path_buf(),
                file_type,
                metadata,
                format!(
                    "file is {:.2} MB, larger than the {:.0} MB limit",
                    size as f64 / BYTES_PER_MB,
                    self.max_file_size_bytes as f64 / BYTES_PER_MB
                ),
            );
        }

        match extract(path, file_type) {
            Ok((content, extra)) => {
                let mut metadata = metadata;
                metadata.extend(extra);
                tracing::debug!("Ingested {} as {}", path.display(), file_type);
                ProcessedFile::new(path.to_path_buf(), file_type, content, metadata)
            }
            Err(e) => {
                tracing::warn!("Failed to process {}: {:#}", path.display(), e);
                ProcessedFile::failed(path.to_path_buf(), file_type, metadata, format!("{:#}", e))
            }
        }
    }

    pub fn process_all(&self, paths: &[PathBuf]) -> Vec<ProcessedFile> {
        paths.iter().map(|path| self.process(path)).collect()
    }
}

fn extract(path: &Path, file_type: FileType) -> Result<(String, Metadata)> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match file_type {
        FileType::Text => read_text(path),
        FileType::Excel => match ext.as_str() {
            "csv" => {
                let (content, mut metadata) = read_text(path)?;
                metadata.insert("sheet_count".into(), json!(1));
                Ok((content, metadata))
            }
            "xls" => bail!("legacy .xls workbooks are not supported; save as .xlsx"),
            _ => {
                let (content, mut metadata) = office::read_xlsx(path)?;
                text::text_metadata(&content, &mut metadata);
                Ok((content, metadata))
            }
        },
        FileType::Word => {
            let (content, mut metadata) = office::read_docx(path)?;
            text::text_metadata(&content, &mut metadata);
            Ok((content, metadata))
        }
        FileType::Image => image::read_image(path),
        FileType::Pdf => {
            let (content, mut metadata) = pdf::read_pdf(path)?;
            text::text_metadata(&content, &mut metadata);
            Ok((content, metadata))
        }
    }
}

fn read_text(path: &Path) -> Result<(String, Metadata)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (content, encoding) = text::decode_bytes(&bytes);
    let mut metadata = Metadata::new();
    metadata.insert("encoding".into(), json!(encoding));
    text::text_metadata(&content, &mut metadata);
    Ok((content, metadata))
}

fn file_metadata(path: &Path) -> Result<Metadata> {
    let stat = fs::metadata(path).with_context(|| format!("File not found: {}", path.display()))?;
    if !stat.is_file() {
        bail!("Not a regular file: {}", path.display());
    }

    let mut metadata = Metadata::new();
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = path.extension().map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
    metadata.insert("file_name".into(), json!(name));
    metadata.insert("file_size".into(), json!(stat.len()));
    metadata.insert("file_size_mb".into(), json!(round_to(stat.len() as f64 / BYTES_PER_MB, 2)));
    metadata.insert("extension".into(), json!(ext.unwrap_or_default()));
    Ok(metadata)
}

/// Expand the command-line inputs into a sorted file list. Directories are
/// walked recursively; hidden entries below them are skipped.
pub fn collect_paths(inputs: &[PathBuf], max_files: usize) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    if files.is_empty() {
        bail!("No input files found");
    }
    if files.len() > max_files {
        bail!("{} files given, but at most {} can be compared at once", files.len(), max_files);
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

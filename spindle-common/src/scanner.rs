//! Recursive audio file discovery
//!
//! Walks a root folder for files with a given extension. Per-entry access
//! errors are logged and skipped; only a missing or unreadable root is fatal,
//! reported before any processing starts.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Root directory exists but cannot be read
    #[error("Directory not readable: {0}")]
    NotReadable(PathBuf),
}

/// Recursive, extension-filtered file scanner
pub struct FileScanner {
    extension: String,
}

impl FileScanner {
    /// Create a scanner for files with the given extension (without the dot)
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_lowercase(),
        }
    }

    /// Scan `root_path` recursively for matching files
    ///
    /// Results are sorted by path so the order is stable within one run.
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        if std::fs::read_dir(root_path).is_err() {
            return Err(ScanError::NotReadable(root_path.to_path_buf()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root_path).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        files.sort();

        tracing::debug!(
            root = %root_path.display(),
            extension = %self.extension,
            count = files.len(),
            "Scan complete"
        );

        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == self.extension)
            .unwrap_or(false)
    }
}

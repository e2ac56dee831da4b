//! FLAC to MP3 conversion via an external ffmpeg binary
//!
//! One file at a time, no parallelism. An existing MP3 next to the source
//! means the file was already converted and is skipped before ffmpeg is
//! ever invoked. After a successful conversion the original FLAC is moved
//! (never deleted) into a sibling holding directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use spindle_common::time;

/// Sibling directory that receives converted FLAC originals
pub const HOLDING_DIR_NAME: &str = "converted_flac_to_be_deleted";

/// Error log file inside the holding directory
pub const ERROR_LOG_NAME: &str = "conversion_errors.log";

/// Converter errors
#[derive(Debug, Error)]
pub enum ConvertError {
    /// External encoder exited non-zero or could not be launched
    #[error("Conversion failed for {0}: {1}")]
    ConversionFailure(PathBuf, String),

    /// Converted fine but the original could not be relocated
    #[error("Could not move {0}: {1}")]
    MoveFailure(PathBuf, String),
}

/// Per-file conversion outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// MP3 written next to the source
    Converted,
    /// Target MP3 already exists; nothing invoked
    Skipped,
    /// Dry-run: reported only, filesystem untouched
    DryRun,
}

/// FLAC to MP3 converter
pub struct FlacConverter {
    dry_run: bool,
}

impl FlacConverter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Verify ffmpeg is installed and on PATH
    pub fn check_ffmpeg() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Target MP3 path for a FLAC file
    pub fn mp3_path(flac: &Path) -> PathBuf {
        flac.with_extension("mp3")
    }

    /// Holding directory next to a FLAC file
    pub fn holding_dir(flac: &Path) -> PathBuf {
        match flac.parent() {
            Some(parent) => parent.join(HOLDING_DIR_NAME),
            None => PathBuf::from(HOLDING_DIR_NAME),
        }
    }

    /// Convert one FLAC file to MP3
    ///
    /// Output contract: 320 kbps, 48 kHz, two channels, ID3v2.4 tags,
    /// metadata and embedded art mapped from the source.
    pub fn convert(&self, flac: &Path) -> Result<Outcome, ConvertError> {
        let mp3 = Self::mp3_path(flac);

        if mp3.exists() {
            tracing::debug!(target_file = %mp3.display(), "Already converted, skipping");
            return Ok(Outcome::Skipped);
        }

        if self.dry_run {
            return Ok(Outcome::DryRun);
        }

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(flac)
            .args(["-vn", "-ar", "48000", "-ac", "2", "-b:a", "320k"])
            .args(["-id3v2_version", "4"])
            .args(["-map_metadata", "0", "-map", "0", "-y"])
            .arg(&mp3)
            .output()
            .map_err(|e| ConvertError::ConversionFailure(flac.to_path_buf(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(ConvertError::ConversionFailure(flac.to_path_buf(), stderr));
        }

        tracing::info!(
            source = %flac.display(),
            target_file = %mp3.display(),
            "Converted"
        );

        Ok(Outcome::Converted)
    }

    /// Move a converted FLAC into the holding directory
    pub fn relocate(&self, flac: &Path) -> Result<PathBuf, ConvertError> {
        let holding = Self::holding_dir(flac);
        let file_name = flac
            .file_name()
            .ok_or_else(|| {
                ConvertError::MoveFailure(flac.to_path_buf(), "no file name".to_string())
            })?;
        let destination = holding.join(file_name);

        if self.dry_run {
            return Ok(destination);
        }

        std::fs::create_dir_all(&holding)
            .map_err(|e| ConvertError::MoveFailure(flac.to_path_buf(), e.to_string()))?;
        std::fs::rename(flac, &destination)
            .map_err(|e| ConvertError::MoveFailure(flac.to_path_buf(), e.to_string()))?;

        tracing::info!(
            source = %flac.display(),
            destination = %destination.display(),
            "Relocated original"
        );

        Ok(destination)
    }

    /// Append a conversion error to the log in the holding directory
    ///
    /// A failing log write is reported but never aborts the batch.
    pub fn log_error(&self, flac: &Path, message: &str) {
        let holding = Self::holding_dir(flac);
        let log_path = holding.join(ERROR_LOG_NAME);

        let name = flac
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| flac.display().to_string());
        let entry = format!(
            "\n[{}] {}\n{}\n{}\n",
            time::log_stamp(),
            name,
            message,
            "-".repeat(60)
        );

        let result = std::fs::create_dir_all(&holding).and_then(|_| {
            use std::io::Write;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .and_then(|mut f| f.write_all(entry.as_bytes()))
        });

        if let Err(e) = result {
            tracing::warn!(log = %log_path.display(), error = %e, "Could not write error log");
        }
    }
}

//! Session reporting: CSV snapshots and the per-run error log
//!
//! Every run writes timestamp-suffixed files into a log subdirectory under
//! the selected folder. Reporting failures are logged and never abort the
//! session.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::TrackMetadata;
use spindle_common::time;

/// Name of the log subdirectory created under the selected folder
pub const LOG_DIR_NAME: &str = "spindle_logs";

/// Which point of the session a snapshot captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLabel {
    /// State at selection time, before any commit
    Before,
    /// State after bulk commits when the user exits early
    AfterBulk,
    /// Final state after the whole session
    After,
}

impl SnapshotLabel {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SnapshotLabel::Before => "metadata_before",
            SnapshotLabel::AfterBulk => "metadata_after_bulk",
            SnapshotLabel::After => "metadata_after",
        }
    }
}

/// Write a full-selection snapshot as CSV
///
/// Fixed columns: filename, artist, album, title, track, year, genre,
/// bitrate, duration. Commas inside text fields become semicolons so the
/// rows stay parseable without a quoting-aware reader.
pub fn write_snapshot(selection: &[TrackMetadata], path: &Path) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str("filename,artist,album,title,track,year,genre,bitrate,duration\n");

    for track in selection {
        let bitrate = track
            .bitrate_kbps
            .map(|b| b.to_string())
            .unwrap_or_default();
        let duration = track
            .duration_seconds
            .map(|d| format!("{:.2}", d))
            .unwrap_or_else(|| "0.00".to_string());

        out.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{},{}\n",
            csv_field(&track.file_name()),
            csv_field(track.artist.as_deref().unwrap_or("")),
            csv_field(track.album.as_deref().unwrap_or("")),
            csv_field(track.title.as_deref().unwrap_or("")),
            csv_field(track.track.as_deref().unwrap_or("")),
            csv_field(track.year.as_deref().unwrap_or("")),
            csv_field(track.genre.as_deref().unwrap_or("")),
            bitrate,
            duration,
        ));
    }

    std::fs::write(path, out)
}

fn csv_field(value: &str) -> String {
    value.replace(',', ";").replace('"', "'")
}

/// Build the timestamped snapshot path for one run
pub fn snapshot_path(log_dir: &Path, label: SnapshotLabel, run_stamp: &str) -> PathBuf {
    log_dir.join(format!("{}_{}.csv", label.file_prefix(), run_stamp))
}

/// Append-only per-run error log: `[timestamp] file: reason` lines
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Error log path for one run
    pub fn new(log_dir: &Path, run_stamp: &str) -> Self {
        Self {
            path: log_dir.join(format!("errors_{}.log", run_stamp)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one per-file error; a failing log write is itself non-fatal
    pub fn record(&self, file: &Path, reason: &str) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        let entry = format!("[{}] {}: {}\n", time::log_stamp(), name, reason);

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(entry.as_bytes()));

        if let Err(e) = result {
            tracing::warn!(log = %self.path.display(), error = %e, "Could not write error log");
        }
    }
}

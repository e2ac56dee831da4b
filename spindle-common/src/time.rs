//! Timestamp formatting helpers

use chrono::Local;

/// Compact timestamp used to suffix per-run log and CSV file names
pub fn run_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Human-readable timestamp used inside error log entries
pub fn log_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

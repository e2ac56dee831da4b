//! spindle-convert - Interactive FLAC to MP3 batch converter
//!
//! Scans a folder recursively for FLAC files, converts each to 320 kbps
//! MP3 with metadata and art preserved, and moves the originals into a
//! sibling holding directory for later review. Already-converted files
//! are skipped so the run is safe to repeat.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use spindle_common::prompt;
use spindle_common::scanner::FileScanner;
use spindle_convert::converter::{FlacConverter, Outcome};

fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("{}", "=".repeat(60));
    println!("  SPINDLE FLAC TO MP3 CONVERTER");
    println!("{}", "=".repeat(60));

    if !FlacConverter::check_ffmpeg() {
        println!("\nERROR: ffmpeg is not installed or not found in PATH");
        println!("Install it with your package manager, e.g.:");
        println!("    apt install ffmpeg    /    brew install ffmpeg");
        anyhow::bail!("ffmpeg not found");
    }

    // Fatal: the root folder must exist and be scannable
    let folder = prompt::read_line("\nFolder containing FLAC files: ")?;
    let root = PathBuf::from(folder);
    let files = FileScanner::new("flac").scan(&root)?;

    if files.is_empty() {
        println!("\nNo FLAC files found in the selected folder.");
        return Ok(());
    }

    show_summary(&files);

    if !prompt::confirm("\nProceed with conversion?")? {
        println!("\nOperation cancelled");
        return Ok(());
    }

    let dry_run = prompt::confirm("\nDry-run mode (preview without converting)?")?;
    if dry_run {
        println!("\nDRY-RUN MODE - no files will be modified");
    }

    let converter = FlacConverter::new(dry_run);

    println!("\n{}", "=".repeat(60));
    println!("Starting conversion...");
    println!("{}", "=".repeat(60));

    let total = files.len();
    let mut successful = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for (idx, flac) in files.iter().enumerate() {
        let display = flac.strip_prefix(&root).unwrap_or(flac).display();
        println!("\n[{}/{}] Processing: {}", idx + 1, total, display);

        match converter.convert(flac) {
            Ok(Outcome::Skipped) => {
                println!("  SKIP: MP3 already exists");
                skipped += 1;
            }
            Ok(Outcome::DryRun) => {
                println!(
                    "  [DRY-RUN] Would convert to {}",
                    FlacConverter::mp3_path(flac).display()
                );
                successful += 1;
            }
            Ok(Outcome::Converted) => {
                println!("  SUCCESS: {}", FlacConverter::mp3_path(flac).display());
                successful += 1;

                // Conversion counts even when the move fails; the failure
                // only lands in the log.
                if let Err(e) = converter.relocate(flac) {
                    println!("  WARNING: could not move original: {}", e);
                    converter.log_error(flac, &e.to_string());
                }
            }
            Err(e) => {
                println!("  FAILED: {}", display);
                failed += 1;
                converter.log_error(flac, &e.to_string());
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("FINAL RESULTS");
    println!("{}", "=".repeat(60));
    println!("Total files: {}", total);
    println!("Successful: {}", successful);
    println!("Skipped (already converted): {}", skipped);
    println!("Failed: {}", failed);

    if failed > 0 {
        println!(
            "\nCheck {} files in the holding directories",
            spindle_convert::converter::ERROR_LOG_NAME
        );
    }
    if dry_run {
        println!("\nDRY-RUN completed - no files were modified");
    }

    info!(successful, skipped, failed, "Conversion run complete");

    Ok(())
}

/// Per-directory breakdown of the files about to be processed
fn show_summary(files: &[PathBuf]) {
    let mut by_dir: BTreeMap<&Path, usize> = BTreeMap::new();
    for file in files {
        if let Some(parent) = file.parent() {
            *by_dir.entry(parent).or_insert(0) += 1;
        }
    }

    println!("\nSUMMARY");
    println!("{}", "=".repeat(60));
    println!("Total FLAC files found: {}", files.len());
    println!("Directories: {}", by_dir.len());

    for (directory, count) in by_dir {
        println!("  {} ({} file(s))", directory.display(), count);
    }
}

//! spindle-tag - Interactive MP3 metadata tagger
//!
//! Prompt-driven session over a folder of MP3 files: select files, apply
//! bulk field edits and cover art, then edit per-file fields with optional
//! online lookup. Before/after CSV snapshots and a per-run error log land
//! in a log subdirectory under the selected folder.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use spindle_common::config::Config;
use spindle_common::prompt;
use spindle_common::scanner::FileScanner;
use spindle_common::time;

use spindle_tag::engine::ReconcileEngine;
use spindle_tag::lookup::{DiscogsProvider, LookupChain, MusicBrainzProvider};
use spindle_tag::report::{self, ErrorLog, SnapshotLabel};
use spindle_tag::selection::parse_selection;
use spindle_tag::store::Id3TagStore;
use spindle_tag::workflow::{self, SessionCounters};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("{}", "=".repeat(60));
    println!("  SPINDLE MP3 METADATA TAGGER");
    println!("{}", "=".repeat(60));

    let config_path = Config::default_path()?;
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Could not load config: {}", e);
            Config::default()
        }
    };
    if config.discogs_token.is_none() {
        setup_discogs(&mut config, &config_path)?;
    }

    // Fatal: the root folder must exist and be scannable
    let folder = prompt::read_line("\nFolder containing MP3 files: ")?;
    let root = PathBuf::from(folder);
    let files = FileScanner::new("mp3").scan(&root)?;

    if files.is_empty() {
        println!("\nNo MP3 files found in the selected folder.");
        return Ok(());
    }

    workflow::display_file_list(&files, &root);

    println!("\nEnter file numbers to tag (e.g., '1,3,5' or '1-10' or 'all')");
    let indices = loop {
        let input = prompt::read_line("\nSelect files: ")?;
        match parse_selection(&input, files.len()) {
            Ok(indices) => break indices,
            Err(message) => println!("{}", message),
        }
    };
    let paths: Vec<PathBuf> = indices.iter().map(|&i| files[i].clone()).collect();
    println!("\nSelected {} file(s)", paths.len());

    let log_dir = root.join(report::LOG_DIR_NAME);
    std::fs::create_dir_all(&log_dir)?;
    let run_stamp = time::run_stamp();
    let errors = ErrorLog::new(&log_dir, &run_stamp);

    let engine = ReconcileEngine::new(Id3TagStore::new());
    let mut selection = engine.load_selection(&paths, &errors);
    let unreadable = paths.len() - selection.len();
    if unreadable > 0 {
        println!("\nSkipping {} unreadable file(s), see error log", unreadable);
    }
    if selection.is_empty() {
        println!("\nNo readable files in the selection.");
        return Ok(());
    }

    // State at selection time, ahead of any commit
    engine.export_snapshot(&selection, SnapshotLabel::Before, &log_dir, &run_stamp);

    println!("\nDo you want to set common values for all selected files?");
    println!("(e.g., same Artist, Album, Year, Genre for the whole album)");
    println!("Changes are applied immediately to all files.");

    let mut bulk_values = Vec::new();
    if prompt::confirm("\nEnable bulk editing?")? {
        bulk_values = workflow::bulk_phase(&engine, &mut selection, &errors)?;
    }
    let cover_applied = workflow::cover_phase(&engine, &mut selection, &root, &errors)?;

    if !bulk_values.is_empty() || cover_applied {
        println!("\nBulk changes have been applied to the selected files.");
        println!("\nOptions:");
        println!("  [1] Done - exit now (bulk changes already saved)");
        println!("  [2] Continue to individual file editing (Title, Track #)");

        if prompt::menu_choice("\nSelect option: ", 2)? == 1 {
            engine.export_snapshot(&selection, SnapshotLabel::AfterBulk, &log_dir, &run_stamp);
            println!("\nBulk editing complete!");
            println!("Logs saved to: {}", log_dir.display());
            return Ok(());
        }
    }

    let chain = build_lookup_chain(&config);
    let mut counters = SessionCounters {
        failed: unreadable,
        ..Default::default()
    };

    println!("\n{}", "=".repeat(60));
    println!("STARTING TAGGING PROCESS");
    println!("{}", "=".repeat(60));

    workflow::individual_phase(
        &engine,
        &chain,
        &mut selection,
        &bulk_values,
        &errors,
        &mut counters,
    )
    .await?;

    engine.export_snapshot(&selection, SnapshotLabel::After, &log_dir, &run_stamp);

    println!("\n{}", "=".repeat(60));
    println!("FINAL RESULTS");
    println!("{}", "=".repeat(60));
    println!("Total files processed: {}", paths.len());
    println!("Successfully tagged: {}", counters.successful);
    println!("Skipped: {}", counters.skipped);
    println!("Failed: {}", counters.failed);
    println!("\nLogs saved to: {}", log_dir.display());

    info!(
        successful = counters.successful,
        skipped = counters.skipped,
        failed = counters.failed,
        "Tagging session complete"
    );

    Ok(())
}

/// Offer to capture the Discogs token on first run; declining just leaves
/// the fallback provider disabled
fn setup_discogs(config: &mut Config, config_path: &Path) -> Result<()> {
    println!("\nDiscogs API token setup");
    println!("To use the Discogs fallback lookup, you need a personal access token.");
    println!("Get one at: https://www.discogs.com/settings/developers");

    if !prompt::confirm("\nDo you want to configure Discogs now?")? {
        return Ok(());
    }

    let token = prompt::read_line("Enter your Discogs token: ")?;
    if token.is_empty() {
        return Ok(());
    }

    config.discogs_token = Some(token);
    match config.save(config_path) {
        Ok(()) => println!("Discogs token saved"),
        Err(e) => println!("Could not save config: {}", e),
    }

    Ok(())
}

/// Primary provider first, then the token-gated fallback
fn build_lookup_chain(config: &Config) -> LookupChain {
    let mut chain = LookupChain::new();

    match MusicBrainzProvider::new() {
        Ok(provider) => chain.push(Box::new(provider)),
        Err(e) => tracing::warn!(error = %e, "MusicBrainz provider unavailable"),
    }

    if let Some(token) = &config.discogs_token {
        match DiscogsProvider::new(token.clone()) {
            Ok(provider) => chain.push(Box::new(provider)),
            Err(e) => tracing::warn!(error = %e, "Discogs provider unavailable"),
        }
    }

    chain
}

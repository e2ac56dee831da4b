//! Interactive tagging session phases
//!
//! Drives the prompt-and-commit loop: bulk field editing, bulk cover art,
//! then per-file editing with online lookup. All transitions are user
//! choices; prompts block, and every confirmed change commits immediately
//! through the reconciliation engine.

use std::io;
use std::path::Path;

use spindle_common::prompt;

use crate::engine::ReconcileEngine;
use crate::lookup::{Candidate, LookupChain};
use crate::report::ErrorLog;
use crate::selection::parse_selection;
use crate::store::TagStore;
use crate::types::{BulkEditRequest, CoverArt, Field, TrackMetadata};

/// Running per-session tally, shown at completion
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of editing one file
enum FileOutcome {
    Applied,
    Skipped,
    Failed,
}

/// Bulk field editing: prompt one value per bulk field and apply each to
/// the whole selection on confirmation
///
/// Returns the values that were actually applied; they pre-fill prompts in
/// the individual phase.
pub fn bulk_phase<S: TagStore>(
    engine: &ReconcileEngine<S>,
    selection: &mut [TrackMetadata],
    errors: &ErrorLog,
) -> io::Result<Vec<(Field, String)>> {
    println!("\n{}", "=".repeat(60));
    println!("BULK FIELD EDITING");
    println!("{}", "=".repeat(60));
    println!("Set common values for all selected files.");
    println!("Press Enter to skip a field (edit individually per file).");

    let mut applied_values = Vec::new();

    for field in Field::BULK {
        let value = prompt::read_line(&format!("\n{} (for all files): ", field.label()))?;
        if value.is_empty() {
            continue;
        }

        let question = format!(
            "  Apply '{}' to all {} files now?",
            value,
            selection.len()
        );
        if !prompt::confirm(&question)? {
            println!("  Skipped - will edit individually");
            continue;
        }

        let mut request = BulkEditRequest::new();
        request.set(field, &value);
        let result = engine.apply_bulk_edit(selection, &request, errors);

        if result.applied > 0 {
            println!("  Applied to {} file(s)", result.applied);
            applied_values.push((field, value));
        }
        if result.failed > 0 {
            println!("  Failed: {} file(s)", result.failed);
        }
    }

    if applied_values.is_empty() {
        println!("\nNo bulk changes applied (will edit each file individually)");
    } else {
        println!("\nBulk changes applied to the selection:");
        for (field, value) in &applied_values {
            println!("   {}: {}", field.label(), value);
        }
    }

    Ok(applied_values)
}

/// Bulk cover art: load an image file and apply it to all or some of the
/// selection. Returns true when any track got the new art.
pub fn cover_phase<S: TagStore>(
    engine: &ReconcileEngine<S>,
    selection: &mut [TrackMetadata],
    root: &Path,
    errors: &ErrorLog,
) -> io::Result<bool> {
    println!("\n{}", "=".repeat(60));
    println!("BULK ALBUM COVER ART");
    println!("{}", "=".repeat(60));

    if !prompt::confirm("\nDo you want to apply album cover art?")? {
        return Ok(false);
    }

    let image_path = prompt::read_line("Path to cover art image: ")?;
    let data = match std::fs::read(&image_path) {
        Ok(data) => data,
        Err(e) => {
            println!("Could not read image: {}", e);
            return Ok(false);
        }
    };
    let cover = CoverArt::from_bytes(data);
    println!("Cover art loaded ({} bytes, {})", cover.data.len(), cover.mime);

    println!("\nApply cover art to:");
    println!("  [1] All selected files");
    println!("  [2] Specific files (choose by number)");
    println!("  [3] Cancel");
    let choice = prompt::menu_choice("\nSelect option: ", 3)?;

    let indices: Vec<usize> = match choice {
        1 => (0..selection.len()).collect(),
        2 => {
            let paths: Vec<_> = selection.iter().map(|t| t.path.clone()).collect();
            display_file_list(&paths, root);
            println!("\nEnter file numbers (e.g., '1,3,5' or '1-10' or 'all')");
            loop {
                let input = prompt::read_line("\nSelect files: ")?;
                match parse_selection(&input, selection.len()) {
                    Ok(indices) => break indices,
                    Err(message) => println!("{}", message),
                }
            }
        }
        _ => {
            println!("Cover art cancelled");
            return Ok(false);
        }
    };

    println!("\nApplying cover art to {} file(s)...", indices.len());

    let mut applied = 0;
    let mut failed = 0;
    for idx in indices {
        let result =
            engine.apply_track_edits(&mut selection[idx], &[], Some(cover.clone()), errors);
        applied += result.applied;
        failed += result.failed;
    }

    if applied > 0 {
        println!("Cover art applied to {} file(s)", applied);
    }
    if failed > 0 {
        println!("Failed: {} file(s)", failed);
    }

    Ok(applied > 0)
}

/// Per-file editing: menu-driven lookup/manual/skip for every selected
/// track, updating the session tally
pub async fn individual_phase<S: TagStore>(
    engine: &ReconcileEngine<S>,
    chain: &LookupChain,
    selection: &mut [TrackMetadata],
    bulk_values: &[(Field, String)],
    errors: &ErrorLog,
    counters: &mut SessionCounters,
) -> io::Result<()> {
    let total = selection.len();

    for (idx, track) in selection.iter_mut().enumerate() {
        println!("\n{}", "=".repeat(60));
        println!("FILE {}/{}: {}", idx + 1, total, track.file_name());
        println!("{}", "=".repeat(60));

        match edit_one_file(engine, chain, track, bulk_values, errors).await? {
            FileOutcome::Applied => {
                println!("SUCCESS: {}", track.file_name());
                counters.successful += 1;
            }
            FileOutcome::Skipped => {
                println!("Skipped: {}", track.file_name());
                counters.skipped += 1;
            }
            FileOutcome::Failed => {
                println!("FAILED: {}", track.file_name());
                counters.failed += 1;
            }
        }
    }

    Ok(())
}

async fn edit_one_file<S: TagStore>(
    engine: &ReconcileEngine<S>,
    chain: &LookupChain,
    track: &mut TrackMetadata,
    bulk_values: &[(Field, String)],
    errors: &ErrorLog,
) -> io::Result<FileOutcome> {
    loop {
        display_track(track);

        println!("\nOptions:");
        println!("  [1] Online lookup");
        println!("  [2] Manual edit");
        println!("  [3] Skip this file");
        let choice = prompt::menu_choice("\nSelect option: ", 3)?;

        let edits = match choice {
            1 => match lookup_edits(chain, track, bulk_values).await? {
                Some(edits) => edits,
                None => continue, // back to the menu
            },
            2 => manual_edits(track)?,
            _ => return Ok(FileOutcome::Skipped),
        };

        if edits.is_empty() {
            println!("\nNo changes detected");
            return Ok(FileOutcome::Skipped);
        }

        preview_changes(track, &edits);
        if !prompt::confirm("\nApply these changes?")? {
            return Ok(FileOutcome::Skipped);
        }

        let result = engine.apply_track_edits(track, &edits, None, errors);
        return Ok(if result.failed > 0 {
            FileOutcome::Failed
        } else {
            FileOutcome::Applied
        });
    }
}

/// Online lookup for one track: query, pick a candidate, then fill in the
/// per-file fields. Returns None to fall back to the menu.
async fn lookup_edits(
    chain: &LookupChain,
    track: &TrackMetadata,
    bulk_values: &[(Field, String)],
) -> io::Result<Option<Vec<(Field, String)>>> {
    if chain.is_empty() {
        println!("\nNo lookup providers available");
        return Ok(None);
    }

    let default_query = track
        .artist
        .clone()
        .or_else(|| track.album.clone())
        .unwrap_or_else(|| {
            track
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });

    println!("\nDefault search query: {}", default_query);
    let mut query = prompt::read_line("Enter search query (or press Enter to use default): ")?;
    if query.is_empty() {
        query = default_query;
    }

    println!("\nSearching for: {}", query);
    let candidates = chain.search(&query).await;

    if candidates.is_empty() {
        println!("No results found");
        return Ok(None);
    }

    println!("\nSEARCH RESULTS ({} found)", candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        println!("\n[{}] {}", idx + 1, candidate.source);
        println!("    Artist: {}", candidate.artist.as_deref().unwrap_or("N/A"));
        println!("    Album:  {}", candidate.album.as_deref().unwrap_or("N/A"));
        println!("    Year:   {}", candidate.year.as_deref().unwrap_or("N/A"));
    }
    println!("\n[0] Back");

    let selected: &Candidate = loop {
        let input = prompt::read_line("\nSelect result (or 0 to go back): ")?;
        match input.parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= candidates.len() => break &candidates[n - 1],
            _ => println!("Invalid selection. Enter 0-{}", candidates.len()),
        }
    };

    let mut edits = candidate_edits(selected, bulk_values, track);

    println!("\nSelected result. Now the per-file fields:");
    edits.extend(prompt_individual_fields(track)?);

    Ok(Some(edits))
}

/// Merge a selected candidate into the album-level fields
///
/// Bulk values already applied in this session take priority over the
/// candidate's; values matching the track's current state produce no edit.
fn candidate_edits(
    candidate: &Candidate,
    bulk_values: &[(Field, String)],
    track: &TrackMetadata,
) -> Vec<(Field, String)> {
    let mut edits = Vec::new();

    for (field, value) in [
        (Field::Artist, candidate.artist.as_deref()),
        (Field::Album, candidate.album.as_deref()),
        (Field::Year, candidate.year.as_deref()),
    ] {
        let bulk = bulk_values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str());
        if let Some(value) = bulk.or(value) {
            if track.get(field) != Some(value) {
                edits.push((field, value.to_string()));
            }
        }
    }

    edits
}

/// Prompt for the per-file fields only; album-level fields belong to the
/// bulk flow
fn manual_edits(track: &TrackMetadata) -> io::Result<Vec<(Field, String)>> {
    println!("\nPress Enter to keep the existing value, or type a new one");
    prompt_individual_fields(track)
}

fn prompt_individual_fields(track: &TrackMetadata) -> io::Result<Vec<(Field, String)>> {
    let mut edits = Vec::new();

    for field in Field::INDIVIDUAL {
        let current = track.get(field).unwrap_or("");
        let input = prompt::read_line(&format!("{} [{}]: ", field.label(), current))?;
        if !input.is_empty() && input != current {
            edits.push((field, input));
        }
    }

    Ok(edits)
}

fn preview_changes(track: &TrackMetadata, edits: &[(Field, String)]) {
    println!("\nChanges:");
    for (field, new_value) in edits {
        println!(
            "  {:8}: {} -> {}",
            field.label(),
            track.get(*field).unwrap_or("(none)"),
            new_value
        );
    }
}

fn display_track(track: &TrackMetadata) {
    println!("\nCurrent metadata:");
    println!("  Title:  {}", track.title.as_deref().unwrap_or("(none)"));
    println!("  Artist: {}", track.artist.as_deref().unwrap_or("(none)"));
    println!("  Album:  {}", track.album.as_deref().unwrap_or("(none)"));
    println!("  Year:   {}", track.year.as_deref().unwrap_or("(none)"));
    println!("  Genre:  {}", track.genre.as_deref().unwrap_or("(none)"));
    println!("  Track:  {}", track.track.as_deref().unwrap_or("(none)"));
    println!("  Cover:  {}", if track.has_cover { "Yes" } else { "No" });
}

/// Numbered file list, paths shown relative to the selected folder
pub fn display_file_list<P: AsRef<Path>>(paths: &[P], root: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("MP3 FILES");
    println!("{}", "=".repeat(60));

    for (idx, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let display = path.strip_prefix(root).unwrap_or(path).display();
        println!("  [{:3}] {}", idx + 1, display);
    }

    println!("\nTotal: {} file(s)", paths.len());
}

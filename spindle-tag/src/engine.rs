//! Tag reconciliation engine
//!
//! Owns the in-memory metadata for one editing session and commits edits to
//! the tag store immediately upon confirmation. Per-file failures are logged
//! and never abort the batch; one track's failed commit does not block or
//! roll back another's success, and committed writes are final.

use std::path::{Path, PathBuf};

use crate::report::{self, ErrorLog, SnapshotLabel};
use crate::store::TagStore;
use crate::types::{BulkEditRequest, CommitResult, CoverArt, Field, TrackMetadata};

pub struct ReconcileEngine<S: TagStore> {
    store: S,
}

impl<S: TagStore> ReconcileEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read current tags for each path
    ///
    /// Unreadable files are logged with a timestamp and skipped; the rest of
    /// the selection loads normally.
    pub fn load_selection(&self, paths: &[PathBuf], errors: &ErrorLog) -> Vec<TrackMetadata> {
        let mut selection = Vec::with_capacity(paths.len());

        for path in paths {
            match self.store.read(path) {
                Ok(track) => selection.push(track),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable file");
                    errors.record(path, &e.to_string());
                }
            }
        }

        tracing::info!(
            requested = paths.len(),
            loaded = selection.len(),
            "Selection loaded"
        );

        selection
    }

    /// Apply one bulk request to every track in the selection
    ///
    /// Fields present in the request overwrite unconditionally; fields
    /// absent from it are left untouched whatever their current value.
    /// Cover art, when present, replaces the embedded image entirely.
    /// Each track commits immediately and independently.
    pub fn apply_bulk_edit(
        &self,
        selection: &mut [TrackMetadata],
        request: &BulkEditRequest,
        errors: &ErrorLog,
    ) -> CommitResult {
        let mut result = CommitResult::default();

        if request.is_empty() {
            return result;
        }

        for track in selection.iter_mut() {
            let before = track.clone();

            for (field, value) in request.fields() {
                track.set(*field, value);
            }
            if let Some(cover) = &request.cover_art {
                track.set_cover(cover.clone());
            }

            self.commit(track, before, errors, &mut result);
        }

        tracing::info!(
            applied = result.applied,
            failed = result.failed,
            "Bulk edit committed"
        );

        result
    }

    /// Apply a single per-file field edit with the same immediate-commit
    /// contract as the bulk flow
    pub fn apply_individual_edit(
        &self,
        track: &mut TrackMetadata,
        field: Field,
        value: &str,
        errors: &ErrorLog,
    ) -> CommitResult {
        self.apply_track_edits(track, &[(field, value.to_string())], None, errors)
    }

    /// Apply several confirmed edits to one track in a single commit
    ///
    /// Used by the per-file flow after the preview/confirm step so the user
    /// sees one write per confirmation, not one per field.
    pub fn apply_track_edits(
        &self,
        track: &mut TrackMetadata,
        edits: &[(Field, String)],
        cover: Option<CoverArt>,
        errors: &ErrorLog,
    ) -> CommitResult {
        let mut result = CommitResult::default();
        let before = track.clone();

        for (field, value) in edits {
            track.set(*field, value);
        }
        if let Some(cover) = cover {
            track.set_cover(cover);
        }

        if !track.is_dirty() {
            // Nothing staged (all values empty); no write, no failure.
            return result;
        }

        self.commit(track, before, errors, &mut result);
        result
    }

    /// Serialize current field values for the selection to a timestamped CSV
    ///
    /// Returns the written path, or `None` when the write failed (logged,
    /// session continues).
    pub fn export_snapshot(
        &self,
        selection: &[TrackMetadata],
        label: SnapshotLabel,
        log_dir: &Path,
        run_stamp: &str,
    ) -> Option<PathBuf> {
        let path = report::snapshot_path(log_dir, label, run_stamp);

        match report::write_snapshot(selection, &path) {
            Ok(()) => {
                tracing::info!(csv = %path.display(), rows = selection.len(), "Snapshot exported");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(csv = %path.display(), error = %e, "Snapshot export failed");
                None
            }
        }
    }

    /// Write one track's staged changes; on failure, restore the in-memory
    /// state so it keeps matching the durable one
    fn commit(
        &self,
        track: &mut TrackMetadata,
        before: TrackMetadata,
        errors: &ErrorLog,
        result: &mut CommitResult,
    ) {
        match self.store.write(track) {
            Ok(()) => {
                track.mark_committed();
                result.record_ok();
            }
            Err(e) => {
                let path = track.path.clone();
                let reason = e.to_string();
                *track = before;
                errors.record(&path, &reason);
                result.record_failure(path, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TagError;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    /// In-memory tag store mirroring the read-modify-write semantics of the
    /// on-disk one: only dirty fields land, everything else is preserved.
    #[derive(Default)]
    struct MemoryTagStore {
        files: RefCell<HashMap<PathBuf, TrackMetadata>>,
        covers: RefCell<HashMap<PathBuf, CoverArt>>,
        corrupt: HashSet<PathBuf>,
        fail_writes: HashSet<PathBuf>,
    }

    impl MemoryTagStore {
        fn with_track(self, path: &str, artist: Option<&str>, title: Option<&str>) -> Self {
            let path = PathBuf::from(path);
            let mut track = TrackMetadata::new(path.clone());
            track.artist = artist.map(String::from);
            track.title = title.map(String::from);
            self.files.borrow_mut().insert(path, track);
            self
        }

        fn corrupt(mut self, path: &str) -> Self {
            self.corrupt.insert(PathBuf::from(path));
            self
        }

        fn failing_writes(mut self, path: &str) -> Self {
            self.fail_writes.insert(PathBuf::from(path));
            self
        }

        fn stored(&self, path: &str) -> TrackMetadata {
            self.files
                .borrow()
                .get(&PathBuf::from(path))
                .cloned()
                .unwrap()
        }

        fn stored_cover(&self, path: &str) -> Option<CoverArt> {
            self.covers.borrow().get(&PathBuf::from(path)).cloned()
        }
    }

    impl TagStore for MemoryTagStore {
        fn read(&self, path: &Path) -> Result<TrackMetadata, TagError> {
            if self.corrupt.contains(path) {
                return Err(TagError::UnreadableFile(
                    path.to_path_buf(),
                    "bad tag header".to_string(),
                ));
            }
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| {
                    TagError::UnreadableFile(path.to_path_buf(), "no such file".to_string())
                })
        }

        fn write(&self, track: &TrackMetadata) -> Result<(), TagError> {
            if self.fail_writes.contains(&track.path) {
                return Err(TagError::WriteFailure(
                    track.path.to_path_buf(),
                    "disk full".to_string(),
                ));
            }

            let mut files = self.files.borrow_mut();
            let stored = files
                .entry(track.path.clone())
                .or_insert_with(|| TrackMetadata::new(track.path.clone()));

            for field in &track.dirty {
                match track.get(*field) {
                    Some(v) => stored.set(*field, v),
                    None => stored.clear(*field),
                }
            }
            stored.dirty.clear();

            if let Some(cover) = &track.pending_cover {
                self.covers
                    .borrow_mut()
                    .insert(track.path.clone(), cover.clone());
                stored.has_cover = true;
            }

            Ok(())
        }
    }

    fn error_log(dir: &TempDir) -> ErrorLog {
        ErrorLog::new(dir.path(), "20260101_120000")
    }

    fn log_lines(log: &ErrorLog) -> Vec<String> {
        std::fs::read_to_string(log.path())
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_bulk_edit_leaves_fields_outside_request_untouched() {
        let store = MemoryTagStore::default()
            .with_track("/m/a.mp3", Some("Old A"), Some("Title A"))
            .with_track("/m/b.mp3", Some("Old B"), Some("Title B"));
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(
            &[PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")],
            &errors,
        );

        let mut request = BulkEditRequest::new();
        request.set(Field::Artist, "X");
        let result = engine.apply_bulk_edit(&mut selection, &request, &errors);

        assert_eq!(result.applied, 2);
        assert_eq!(result.failed, 0);

        for (path, title) in [("/m/a.mp3", "Title A"), ("/m/b.mp3", "Title B")] {
            let stored = engine.store.stored(path);
            assert_eq!(stored.artist.as_deref(), Some("X"));
            assert_eq!(stored.title.as_deref(), Some(title));
        }
    }

    #[test]
    fn test_load_selection_skips_corrupt_file_and_logs_once() {
        let store = MemoryTagStore::default()
            .with_track("/m/a.mp3", None, None)
            .with_track("/m/b.mp3", None, None)
            .corrupt("/m/bad.mp3");
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let selection = engine.load_selection(
            &[
                PathBuf::from("/m/a.mp3"),
                PathBuf::from("/m/bad.mp3"),
                PathBuf::from("/m/b.mp3"),
            ],
            &errors,
        );

        assert_eq!(selection.len(), 2);
        let lines = log_lines(&errors);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("bad.mp3"));
        assert!(lines[0].contains("Unreadable"));
    }

    #[test]
    fn test_one_failed_commit_does_not_block_others() {
        let store = MemoryTagStore::default()
            .with_track("/m/a.mp3", None, None)
            .with_track("/m/b.mp3", Some("Keep"), None)
            .with_track("/m/c.mp3", None, None)
            .failing_writes("/m/b.mp3");
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(
            &[
                PathBuf::from("/m/a.mp3"),
                PathBuf::from("/m/b.mp3"),
                PathBuf::from("/m/c.mp3"),
            ],
            &errors,
        );

        let mut request = BulkEditRequest::new();
        request.set(Field::Artist, "X");
        let result = engine.apply_bulk_edit(&mut selection, &request, &errors);

        assert_eq!(result.applied, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].0, PathBuf::from("/m/b.mp3"));

        // Successful tracks are committed
        assert_eq!(engine.store.stored("/m/a.mp3").artist.as_deref(), Some("X"));
        assert_eq!(engine.store.stored("/m/c.mp3").artist.as_deref(), Some("X"));
        // Failed track: durable and in-memory state both keep the old value
        assert_eq!(
            engine.store.stored("/m/b.mp3").artist.as_deref(),
            Some("Keep")
        );
        assert_eq!(selection[1].artist.as_deref(), Some("Keep"));
        assert!(!selection[1].is_dirty());
    }

    #[test]
    fn test_cover_art_replacement_is_all_or_nothing() {
        let old_blob = CoverArt::from_bytes(b"GIF89a-old".to_vec());
        let store = MemoryTagStore::default()
            .with_track("/m/ok.mp3", None, None)
            .with_track("/m/fail.mp3", None, None)
            .failing_writes("/m/fail.mp3");
        store
            .covers
            .borrow_mut()
            .insert(PathBuf::from("/m/fail.mp3"), old_blob.clone());

        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(
            &[PathBuf::from("/m/ok.mp3"), PathBuf::from("/m/fail.mp3")],
            &errors,
        );

        let new_blob = CoverArt::from_bytes(b"\x89PNG-new".to_vec());
        let mut request = BulkEditRequest::new();
        request.cover_art = Some(new_blob.clone());
        let result = engine.apply_bulk_edit(&mut selection, &request, &errors);

        assert_eq!(result.applied, 1);
        assert_eq!(result.failed, 1);
        // Success: embedded image equals the uploaded blob exactly
        assert_eq!(engine.store.stored_cover("/m/ok.mp3"), Some(new_blob));
        // Failure: prior value intact, never a partial blend
        assert_eq!(engine.store.stored_cover("/m/fail.mp3"), Some(old_blob));
    }

    #[test]
    fn test_individual_edit_touches_one_field_of_one_track() {
        let store = MemoryTagStore::default()
            .with_track("/m/a.mp3", Some("A"), Some("Old"))
            .with_track("/m/b.mp3", Some("A"), Some("Other"));
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(
            &[PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")],
            &errors,
        );

        let result =
            engine.apply_individual_edit(&mut selection[0], Field::Title, "New", &errors);

        assert_eq!(result.applied, 1);
        assert_eq!(engine.store.stored("/m/a.mp3").title.as_deref(), Some("New"));
        assert_eq!(engine.store.stored("/m/a.mp3").artist.as_deref(), Some("A"));
        assert_eq!(
            engine.store.stored("/m/b.mp3").title.as_deref(),
            Some("Other")
        );
    }

    #[test]
    fn test_empty_edits_do_not_write() {
        let store = MemoryTagStore::default().with_track("/m/a.mp3", Some("A"), None);
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(&[PathBuf::from("/m/a.mp3")], &errors);

        let result = engine.apply_track_edits(
            &mut selection[0],
            &[(Field::Title, "   ".to_string())],
            None,
            &errors,
        );

        assert_eq!(result.applied, 0);
        assert_eq!(result.failed, 0);
    }

    /// Full session shape: bulk artist on three tracks, individual title on
    /// the second, then the after snapshot.
    #[test]
    fn test_bulk_then_individual_end_to_end() {
        let store = MemoryTagStore::default()
            .with_track("/m/t1.mp3", Some("Old"), Some("Keep One"))
            .with_track("/m/t2.mp3", Some("Old"), Some("Replace Me"))
            .with_track("/m/t3.mp3", Some("Old"), Some("Keep Three"));
        let engine = ReconcileEngine::new(store);
        let temp = TempDir::new().unwrap();
        let errors = error_log(&temp);

        let mut selection = engine.load_selection(
            &[
                PathBuf::from("/m/t1.mp3"),
                PathBuf::from("/m/t2.mp3"),
                PathBuf::from("/m/t3.mp3"),
            ],
            &errors,
        );

        let mut request = BulkEditRequest::new();
        request.set(Field::Artist, "X");
        assert_eq!(engine.apply_bulk_edit(&mut selection, &request, &errors).applied, 3);

        assert_eq!(
            engine
                .apply_individual_edit(&mut selection[1], Field::Title, "Y", &errors)
                .applied,
            1
        );

        for path in ["/m/t1.mp3", "/m/t2.mp3", "/m/t3.mp3"] {
            assert_eq!(engine.store.stored(path).artist.as_deref(), Some("X"));
        }
        assert_eq!(engine.store.stored("/m/t1.mp3").title.as_deref(), Some("Keep One"));
        assert_eq!(engine.store.stored("/m/t2.mp3").title.as_deref(), Some("Y"));
        assert_eq!(engine.store.stored("/m/t3.mp3").title.as_deref(), Some("Keep Three"));

        let csv = engine
            .export_snapshot(&selection, SnapshotLabel::After, temp.path(), "20260101_120000")
            .unwrap();
        let contents = std::fs::read_to_string(csv).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().skip(1).all(|l| l.contains("\"X\"")));
        assert!(lines[2].contains("\"Y\""));
        assert!(lines[1].contains("\"Keep One\""));
        assert!(lines[3].contains("\"Keep Three\""));
    }

    #[test]
    fn test_export_failure_is_non_fatal() {
        let store = MemoryTagStore::default();
        let engine = ReconcileEngine::new(store);

        let result = engine.export_snapshot(
            &[],
            SnapshotLabel::Before,
            Path::new("/nonexistent/log/dir"),
            "20260101_120000",
        );

        assert!(result.is_none());
    }
}

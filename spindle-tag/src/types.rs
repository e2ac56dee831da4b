//! Core data types for the tag reconciliation engine

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Editable metadata field of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Artist,
    Album,
    Title,
    Year,
    Genre,
    Track,
}

impl Field {
    /// All fields, in the order they appear in prompts and CSV columns
    pub const ALL: [Field; 6] = [
        Field::Artist,
        Field::Album,
        Field::Title,
        Field::Year,
        Field::Genre,
        Field::Track,
    ];

    /// Fields the bulk flow covers uniformly; title and track number are
    /// inherently per-file and stay with the individual flow
    pub const BULK: [Field; 4] = [Field::Artist, Field::Album, Field::Year, Field::Genre];

    /// Fields edited per file
    pub const INDIVIDUAL: [Field; 2] = [Field::Title, Field::Track];

    /// Human-readable label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            Field::Artist => "Artist",
            Field::Album => "Album",
            Field::Title => "Title",
            Field::Year => "Year",
            Field::Genre => "Genre",
            Field::Track => "Track",
        }
    }

    /// ID3v2 text frame identifier for this field
    pub fn frame_id(&self) -> &'static str {
        match self {
            Field::Artist => "TPE1",
            Field::Album => "TALB",
            Field::Title => "TIT2",
            Field::Year => "TDRC",
            Field::Genre => "TCON",
            Field::Track => "TRCK",
        }
    }
}

/// Embedded cover art: raw image bytes plus sniffed MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: String,
}

impl CoverArt {
    /// Wrap image bytes, detecting the MIME type from magic bytes
    ///
    /// JPEG is the default when no other signature matches.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime = if data.starts_with(b"\x89PNG") {
            "image/png"
        } else if data.starts_with(b"GIF") {
            "image/gif"
        } else if data.starts_with(b"BM") {
            "image/bmp"
        } else {
            "image/jpeg"
        };

        Self {
            data,
            mime: mime.to_string(),
        }
    }
}

impl std::fmt::Debug for CoverArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverArt")
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}

/// In-memory metadata for one audio file
///
/// Absent/empty means "unset". `dirty` tracks fields changed since the last
/// commit; it exists only for the duration of an edit session and is never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct TrackMetadata {
    /// Full file path on disk; immutable once discovered
    pub path: PathBuf,

    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub track: Option<String>,

    /// Whether the file has embedded cover art
    pub has_cover: bool,

    /// Cover art staged for the next commit; replaces the embedded image
    /// entirely when present
    pub pending_cover: Option<CoverArt>,

    /// Derived read-only properties (exported in snapshots)
    pub bitrate_kbps: Option<u32>,
    pub duration_seconds: Option<f64>,

    /// Fields changed since the last commit
    pub dirty: BTreeSet<Field>,
}

impl TrackMetadata {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Current value of a field, if set
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Artist => self.artist.as_deref(),
            Field::Album => self.album.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Year => self.year.as_deref(),
            Field::Genre => self.genre.as_deref(),
            Field::Track => self.track.as_deref(),
        }
    }

    /// Set a field to a non-empty value and mark it dirty
    ///
    /// Empty/whitespace values are ignored: a field is never overwritten
    /// with nothing unless explicitly cleared via [`clear`](Self::clear).
    pub fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.slot(field).replace(value.to_string());
        self.dirty.insert(field);
    }

    /// Explicitly clear a field and mark it dirty
    pub fn clear(&mut self, field: Field) {
        self.slot(field).take();
        self.dirty.insert(field);
    }

    /// Stage replacement cover art for the next commit
    pub fn set_cover(&mut self, cover: CoverArt) {
        self.pending_cover = Some(cover);
    }

    /// Mark all staged changes as committed
    pub fn mark_committed(&mut self) {
        if self.pending_cover.take().is_some() {
            self.has_cover = true;
        }
        self.dirty.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty() || self.pending_cover.is_some()
    }

    /// File name for display and CSV rows
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Artist => &mut self.artist,
            Field::Album => &mut self.album,
            Field::Title => &mut self.title,
            Field::Year => &mut self.year,
            Field::Genre => &mut self.genre,
            Field::Track => &mut self.track,
        }
    }
}

/// One prompt-response worth of bulk edits: a subset of fields mapped to a
/// single value each, plus optional replacement cover art. Applied exactly
/// once to a selection, then discarded.
#[derive(Debug, Clone, Default)]
pub struct BulkEditRequest {
    fields: Vec<(Field, String)>,
    pub cover_art: Option<CoverArt>,
}

impl BulkEditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a field in the request; empty values are rejected so absent
    /// and empty stay indistinguishable (both mean "leave untouched")
    pub fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.fields.retain(|(f, _)| *f != field);
        self.fields.push((field, value.to_string()));
    }

    pub fn fields(&self) -> &[(Field, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.cover_art.is_none()
    }
}

/// Outcome of committing edits to one or more tracks
#[derive(Debug, Clone, Default)]
pub struct CommitResult {
    /// Tracks written successfully
    pub applied: usize,
    /// Tracks that failed to commit
    pub failed: usize,
    /// Failed paths with reasons
    pub failures: Vec<(PathBuf, String)>,
}

impl CommitResult {
    pub fn record_ok(&mut self) {
        self.applied += 1;
    }

    pub fn record_failure(&mut self, path: PathBuf, reason: String) {
        self.failed += 1;
        self.failures.push((path, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_empty_value() {
        let mut track = TrackMetadata::new(PathBuf::from("/music/a.mp3"));
        track.artist = Some("Old".to_string());

        track.set(Field::Artist, "   ");

        assert_eq!(track.artist.as_deref(), Some("Old"));
        assert!(track.dirty.is_empty());
    }

    #[test]
    fn test_set_marks_dirty() {
        let mut track = TrackMetadata::new(PathBuf::from("/music/a.mp3"));
        track.set(Field::Title, "Song");

        assert_eq!(track.title.as_deref(), Some("Song"));
        assert!(track.dirty.contains(&Field::Title));
        assert!(!track.dirty.contains(&Field::Artist));
    }

    #[test]
    fn test_clear_is_explicit_and_dirty() {
        let mut track = TrackMetadata::new(PathBuf::from("/music/a.mp3"));
        track.genre = Some("Rock".to_string());

        track.clear(Field::Genre);

        assert!(track.genre.is_none());
        assert!(track.dirty.contains(&Field::Genre));
    }

    #[test]
    fn test_mark_committed_clears_dirty_and_promotes_cover() {
        let mut track = TrackMetadata::new(PathBuf::from("/music/a.mp3"));
        track.set(Field::Artist, "X");
        track.set_cover(CoverArt::from_bytes(vec![0xFF, 0xD8, 0xFF]));

        track.mark_committed();

        assert!(track.dirty.is_empty());
        assert!(track.pending_cover.is_none());
        assert!(track.has_cover);
    }

    #[test]
    fn test_bulk_request_drops_empty_values() {
        let mut request = BulkEditRequest::new();
        request.set(Field::Artist, "");
        request.set(Field::Album, "  ");

        assert!(request.is_empty());
    }

    #[test]
    fn test_bulk_request_last_value_wins_per_field() {
        let mut request = BulkEditRequest::new();
        request.set(Field::Artist, "First");
        request.set(Field::Artist, "Second");

        assert_eq!(request.fields().len(), 1);
        assert_eq!(request.fields()[0].1, "Second");
    }

    #[test]
    fn test_cover_art_mime_sniffing() {
        assert_eq!(
            CoverArt::from_bytes(b"\x89PNG\r\n".to_vec()).mime,
            "image/png"
        );
        assert_eq!(CoverArt::from_bytes(b"GIF89a".to_vec()).mime, "image/gif");
        assert_eq!(CoverArt::from_bytes(b"BMxxxx".to_vec()).mime, "image/bmp");
        assert_eq!(
            CoverArt::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]).mime,
            "image/jpeg"
        );
    }

    #[test]
    fn test_field_frame_ids() {
        assert_eq!(Field::Artist.frame_id(), "TPE1");
        assert_eq!(Field::Title.frame_id(), "TIT2");
        assert_eq!(Field::Track.frame_id(), "TRCK");
    }
}

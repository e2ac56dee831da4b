//! Tag storage: reading and writing ID3 metadata for one file
//!
//! The store is the single writer of the durable on-disk representation.
//! Writes are read-modify-write against the existing tag so frames the
//! caller did not touch are preserved exactly.

use std::path::{Path, PathBuf};

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use lofty::prelude::*;
use lofty::probe::Probe;
use thiserror::Error;

use crate::types::TrackMetadata;

/// Tag store errors
#[derive(Debug, Error)]
pub enum TagError {
    /// Tag data cannot be parsed from the file
    #[error("Unreadable file {0}: {1}")]
    UnreadableFile(PathBuf, String),

    /// Disk, permission, or transient NAS failure while writing
    #[error("Write failure {0}: {1}")]
    WriteFailure(PathBuf, String),
}

/// Read/write access to one file's persistent tag data
pub trait TagStore {
    /// Read current tags and derived properties for `path`
    fn read(&self, path: &Path) -> Result<TrackMetadata, TagError>;

    /// Commit a track's staged changes (dirty fields and pending cover art)
    ///
    /// Fields not staged must survive the write bit-identical.
    fn write(&self, track: &TrackMetadata) -> Result<(), TagError>;
}

/// ID3v2.4-backed tag store for MP3 files
pub struct Id3TagStore;

impl Id3TagStore {
    pub fn new() -> Self {
        Self
    }

    /// Load the on-disk tag, treating a missing tag as empty
    fn load_tag(path: &Path) -> Result<Tag, TagError> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(tag),
            Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(Tag::new()),
            Err(e) => Err(TagError::UnreadableFile(path.to_path_buf(), e.to_string())),
        }
    }

    fn text_frame(tag: &Tag, id: &str) -> Option<String> {
        tag.get(id)
            .and_then(|frame| frame.content().text())
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
    }

    /// Best-effort audio properties; tag editing works without them
    fn probe_properties(path: &Path) -> (Option<u32>, Option<f64>) {
        match Probe::open(path).and_then(|p| p.read()) {
            Ok(tagged_file) => {
                let properties = tagged_file.properties();
                (
                    properties.audio_bitrate(),
                    Some(properties.duration().as_secs_f64()),
                )
            }
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "No audio properties");
                (None, None)
            }
        }
    }
}

impl Default for Id3TagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TagStore for Id3TagStore {
    fn read(&self, path: &Path) -> Result<TrackMetadata, TagError> {
        let tag = Self::load_tag(path)?;

        let mut track = TrackMetadata::new(path.to_path_buf());
        track.artist = Self::text_frame(&tag, "TPE1");
        track.album = Self::text_frame(&tag, "TALB");
        track.title = Self::text_frame(&tag, "TIT2");
        track.year = Self::text_frame(&tag, "TDRC");
        track.genre = Self::text_frame(&tag, "TCON");
        track.track = Self::text_frame(&tag, "TRCK");
        track.has_cover = tag.pictures().next().is_some();

        let (bitrate_kbps, duration_seconds) = Self::probe_properties(path);
        track.bitrate_kbps = bitrate_kbps;
        track.duration_seconds = duration_seconds;

        tracing::debug!(
            file = %path.display(),
            artist = ?track.artist,
            title = ?track.title,
            "Read tags"
        );

        Ok(track)
    }

    fn write(&self, track: &TrackMetadata) -> Result<(), TagError> {
        let mut tag = Self::load_tag(&track.path)?;

        // Only staged fields are touched; everything else in the tag
        // (including frames this tool does not model) is carried over.
        for field in &track.dirty {
            match track.get(*field) {
                Some(value) => tag.set_text(field.frame_id(), value.to_string()),
                None => {
                    let _ = tag.remove(field.frame_id());
                }
            }
        }

        if let Some(cover) = &track.pending_cover {
            tag.remove_all_pictures();
            tag.add_frame(Picture {
                mime_type: cover.mime.clone(),
                picture_type: PictureType::CoverFront,
                description: "Cover".to_string(),
                data: cover.data.clone(),
            });
        }

        tag.write_to_path(&track.path, Version::Id3v24)
            .map_err(|e| TagError::WriteFailure(track.path.to_path_buf(), e.to_string()))?;

        tracing::debug!(
            file = %track.path.display(),
            fields = ?track.dirty,
            cover = track.pending_cover.is_some(),
            "Wrote tags"
        );

        Ok(())
    }
}

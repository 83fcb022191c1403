//! Audio tag extraction.
//!
//! Reads title, album, artist, genre, track number and the first embedded
//! picture from an audio file using the lofty crate.

use std::path::{Path, PathBuf};

use lofty::file::TaggedFileExt;
use lofty::tag::Accessor;
use thiserror::Error;

/// Errors returned by a [`MetadataExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unable to open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Picture embedded in an audio file's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    /// Raw image bytes as stored in the tag.
    pub data: Vec<u8>,
    /// MIME type declared by the tag, if any.
    pub mime: Option<String>,
}

/// Tag fields read from an audio file.
///
/// Missing fields are left empty; a missing track number is `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub album: String,
    pub artist: String,
    pub genre: String,
    pub track_number: u32,
    pub cover_art: Option<EmbeddedPicture>,
}

/// Reads metadata from audio files.
pub trait MetadataExtractor: Send + Sync {
    /// Extract tags from `path`.
    ///
    /// Returns [`ExtractError::Unreadable`] only when the file cannot be opened
    /// as audio at all. A readable file without tags yields empty metadata.
    fn extract(&self, path: &Path) -> Result<TrackMetadata, ExtractError>;
}

/// Extractor backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyExtractor;

impl MetadataExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<TrackMetadata, ExtractError> {
        let tagged_file = lofty::read_from_path(path).map_err(|e| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        // Try primary tag first, then any available tag
        let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        else {
            return Ok(TrackMetadata::default());
        };

        let cover_art = tag.pictures().first().map(|p| EmbeddedPicture {
            data: p.data().to_vec(),
            mime: p.mime_type().map(|m| m.as_str().to_string()),
        });

        Ok(TrackMetadata {
            title: tag.title().map(|s| s.to_string()).unwrap_or_default(),
            album: tag.album().map(|s| s.to_string()).unwrap_or_default(),
            artist: tag.artist().map(|s| s.to_string()).unwrap_or_default(),
            genre: tag.genre().map(|s| s.to_string()).unwrap_or_default(),
            track_number: tag.track().unwrap_or(0),
            cover_art,
        })
    }
}

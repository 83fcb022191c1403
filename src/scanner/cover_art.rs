//! Cover art sidecar caching.
//!
//! Embedded cover art is written next to the audio file as a PNG named after
//! the file (`song.mp3` becomes `song.mp3.png`). A sidecar that already exists
//! is never rewritten.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use super::metadata::EmbeddedPicture;

/// Extension appended to the audio file name to form the sidecar path.
const SIDECAR_EXTENSION: &str = "png";

/// Errors raised while writing a sidecar image.
#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("Failed to decode embedded image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// What the policy did for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverArtDecision {
    /// The file carries no embedded picture.
    NotFound,
    /// The embedded picture was written to a new sidecar.
    Written(PathBuf),
    /// A sidecar was already on disk and was left alone.
    Existing(PathBuf),
}

impl CoverArtDecision {
    /// Path to report as the track's cover art, if any.
    pub fn cover_art_path(&self) -> Option<&Path> {
        match self {
            CoverArtDecision::NotFound => None,
            CoverArtDecision::Written(path) | CoverArtDecision::Existing(path) => Some(path),
        }
    }
}

/// Sidecar path for an audio file.
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

/// Decide and apply the sidecar caching for one file.
pub fn cache_cover_art(
    file: &Path,
    picture: Option<&EmbeddedPicture>,
) -> Result<CoverArtDecision, CoverArtError> {
    let Some(picture) = picture else {
        tracing::warn!("No cover art was found in {}", file.display());
        return Ok(CoverArtDecision::NotFound);
    };

    let sidecar = sidecar_path(file);
    if sidecar.exists() {
        tracing::debug!("Reusing cover art {}", sidecar.display());
        return Ok(CoverArtDecision::Existing(sidecar));
    }

    let img = image::load_from_memory(&picture.data).map_err(CoverArtError::Decode)?;
    img.save_with_format(&sidecar, ImageFormat::Png)
        .map_err(|source| CoverArtError::Write {
            path: sidecar.clone(),
            source,
        })?;

    tracing::debug!("Wrote cover art {}", sidecar.display());
    Ok(CoverArtDecision::Written(sidecar))
}

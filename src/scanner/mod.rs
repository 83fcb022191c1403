//! Music library scanner.
//!
//! Walks music folders, reads audio file metadata, and caches embedded cover art.

pub mod cover_art;
pub mod metadata;
pub mod walker;

pub use cover_art::{CoverArtDecision, CoverArtError, cache_cover_art, sidecar_path};
pub use metadata::{EmbeddedPicture, ExtractError, LoftyExtractor, MetadataExtractor, TrackMetadata};
pub use walker::FolderWalker;

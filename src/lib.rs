//! Media library indexer.
//!
//! Discovers audio files in queued folders, reads their tags, caches embedded
//! cover art, and publishes the resulting track URIs to a track-list sink.

pub mod config;
pub mod error;
pub mod indexer;
pub mod scanner;
pub mod tracklist;

pub use config::IndexerConfig;
pub use error::{ErrorKind, IndexerError};
pub use indexer::{IndexerEvent, IndexerState, MediaIndexer};

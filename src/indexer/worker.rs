//! Single-folder scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::events::{EventBus, IndexerEvent};
use super::state::{IndexerState, StateController};
use crate::scanner::walker::has_extension;
use crate::scanner::{CoverArtDecision, FolderWalker, MetadataExtractor, cache_cover_art};
use crate::tracklist::TrackListSink;

/// A queued folder operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub folder: PathBuf,
    /// Set for `remove_folder` requests.
    pub removal: bool,
}

impl ScanRequest {
    pub fn add(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            removal: false,
        }
    }

    pub fn remove(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            removal: true,
        }
    }
}

/// A file indexed during one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub uri: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub genre: String,
    pub track_number: u32,
    pub cover_art_path: Option<PathBuf>,
}

/// Counters for one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_found: usize,
    pub tracks_indexed: usize,
    pub files_unreadable: usize,
    pub cover_art_written: usize,
    pub cover_art_reused: usize,
}

/// Result of one worker run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub succeeded: bool,
    /// Track URIs in discovery order.
    pub uris: Vec<String>,
    pub tracks: Vec<TrackRecord>,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Outcome of a scan that stopped before publishing its results.
    pub fn failed(summary: ScanSummary) -> Self {
        Self {
            succeeded: false,
            summary,
            ..Default::default()
        }
    }
}

/// Build the `file://` URI for an absolute path.
///
/// Each path segment is percent-encoded from its raw bytes, so names that are
/// not valid UTF-8 still map back to the file.
pub fn file_uri(path: &Path) -> String {
    let encoded: Vec<_> = path
        .as_os_str()
        .as_encoded_bytes()
        .split(|b| *b == b'/')
        .map(urlencoding::encode_binary)
        .collect();
    format!("file://{}", encoded.join("/"))
}

/// Executes one folder scan end to end.
pub struct ScanWorker {
    walker: FolderWalker,
    cover_art_extensions: Vec<String>,
    extractor: Arc<dyn MetadataExtractor>,
    sink: Arc<dyn TrackListSink>,
    state: Arc<StateController>,
    events: EventBus,
}

impl ScanWorker {
    pub fn new(
        walker: FolderWalker,
        cover_art_extensions: &[String],
        extractor: Arc<dyn MetadataExtractor>,
        sink: Arc<dyn TrackListSink>,
        state: Arc<StateController>,
        events: EventBus,
    ) -> Self {
        Self {
            walker,
            cover_art_extensions: cover_art_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            extractor,
            sink,
            state,
            events,
        }
    }

    /// Scan the request's folder, replacing the sink's contents with what was found.
    ///
    /// Blocks for the duration of the scan. `cancel` is checked before every
    /// file; once it fires the scan stops, nothing is appended to the sink,
    /// and the outcome is failed.
    pub fn run(&self, request: &ScanRequest, cancel: &CancellationToken) -> ScanOutcome {
        self.state.set(IndexerState::Active);

        let folder =
            std::path::absolute(&request.folder).unwrap_or_else(|_| request.folder.clone());
        if request.removal {
            tracing::warn!(
                "Removal of {} re-indexes the folder; tracks already in the list are not purged",
                folder.display()
            );
        }
        tracing::info!("Scanning path: {}", folder.display());
        self.events.emit(IndexerEvent::ScanStarted {
            folder: folder.clone(),
            removal: request.removal,
        });
        self.events.progress(0.0);

        let files: Vec<PathBuf> = self.walker.walk(&folder).collect();
        let total = files.len();
        tracing::info!("Total files: {}", total);

        let mut summary = ScanSummary {
            files_found: total,
            ..Default::default()
        };
        let mut uris = Vec::with_capacity(total);
        let mut tracks = Vec::with_capacity(total);

        self.sink.clear();

        if total == 0 {
            self.events.progress(1.0);
        }

        for (index, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    "Shutdown requested, aborting scan of {} after {} of {} files",
                    folder.display(),
                    index,
                    total
                );
                return ScanOutcome::failed(summary);
            }

            tracing::debug!("Processing file: {}", path.display());
            if let Some(track) = self.index_file(path, &mut summary) {
                uris.push(track.uri.clone());
                tracks.push(track);
            }

            self.events.progress((index + 1) as f64 / total as f64);
        }

        summary.tracks_indexed = uris.len();
        self.sink.add(&uris, 0);

        tracing::info!(
            "Scan of {} complete: found={}, indexed={}, unreadable={}, covers written={}, covers reused={}",
            folder.display(),
            summary.files_found,
            summary.tracks_indexed,
            summary.files_unreadable,
            summary.cover_art_written,
            summary.cover_art_reused
        );

        ScanOutcome {
            succeeded: true,
            uris,
            tracks,
            summary,
        }
    }

    /// Read one file. Returns `None` when the file cannot be opened at all.
    fn index_file(&self, path: &Path, summary: &mut ScanSummary) -> Option<TrackRecord> {
        let uri = file_uri(path);

        let metadata = match self.extractor.extract(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Skipping {}", e);
                summary.files_unreadable += 1;
                return None;
            }
        };

        let mut cover_art_path = None;
        if has_extension(path, &self.cover_art_extensions) {
            match cache_cover_art(path, metadata.cover_art.as_ref()) {
                Ok(decision) => {
                    match decision {
                        CoverArtDecision::Written(_) => summary.cover_art_written += 1,
                        CoverArtDecision::Existing(_) => summary.cover_art_reused += 1,
                        CoverArtDecision::NotFound => {}
                    }
                    cover_art_path = decision.cover_art_path().map(Path::to_path_buf);
                }
                Err(e) => {
                    tracing::warn!("Cover art for {} not cached: {}", path.display(), e);
                }
            }
        }

        Some(TrackRecord {
            uri,
            title: metadata.title,
            album: metadata.album,
            artist: metadata.artist,
            genre: metadata.genre,
            track_number: metadata.track_number,
            cover_art_path,
        })
    }
}

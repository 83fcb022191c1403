//! Media indexer.
//!
//! Folder add/remove requests are queued and scanned one at a time on the
//! blocking pool. Observers follow the indexer through [`IndexerEvent`]s.

pub mod events;
pub mod scheduler;
pub mod state;
pub mod worker;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub use events::{EventBus, IndexerEvent};
pub use scheduler::ScanScheduler;
pub use state::{IndexerState, StateController};
pub use worker::{ScanOutcome, ScanRequest, ScanSummary, ScanWorker, TrackRecord, file_uri};

use crate::config::IndexerConfig;
use crate::error::{ErrorKind, IndexerError};
use crate::scanner::{FolderWalker, MetadataExtractor};
use crate::tracklist::TrackListSink;

/// Handle to a running media indexer.
pub struct MediaIndexer {
    scheduler: Arc<ScanScheduler>,
    state: Arc<StateController>,
    events: EventBus,
    cancel: CancellationToken,
}

impl MediaIndexer {
    /// Create an indexer on the current tokio runtime.
    ///
    /// The returned receiver is subscribed before `config.initial_folders` are
    /// queued, so it observes their scans from the start.
    pub fn new(
        config: IndexerConfig,
        extractor: Arc<dyn MetadataExtractor>,
        sink: Arc<dyn TrackListSink>,
    ) -> Result<(Self, broadcast::Receiver<IndexerEvent>), IndexerError> {
        let runtime = Handle::try_current().map_err(|_| IndexerError::NoRuntime)?;

        let events = EventBus::new(config.event_capacity);
        let rx = events.subscribe();
        let state = Arc::new(StateController::new(events.clone()));
        let cancel = CancellationToken::new();

        let worker = ScanWorker::new(
            FolderWalker::new(&config.extensions),
            &config.cover_art_extensions,
            extractor,
            sink,
            state.clone(),
            events.clone(),
        );
        let scheduler = Arc::new(ScanScheduler::new(
            worker,
            state.clone(),
            events.clone(),
            cancel.clone(),
            runtime,
        ));

        let indexer = Self {
            scheduler,
            state,
            events,
            cancel,
        };
        for folder in config.initial_folders {
            indexer.add_folder(folder);
        }

        Ok((indexer, rx))
    }

    /// Queue a folder for indexing.
    pub fn add_folder(&self, path: impl Into<PathBuf>) {
        self.scheduler.enqueue(ScanRequest::add(path));
    }

    /// Queue a folder removal.
    ///
    /// The folder is scanned again like an added one; tracks it contributed
    /// earlier are not purged from the track list.
    pub fn remove_folder(&self, path: impl Into<PathBuf>) {
        self.scheduler.enqueue(ScanRequest::remove(path));
    }

    /// Re-publish the current state and signal that initialization completed.
    pub fn initialize(&self) {
        self.state.republish();
        self.events.emit(IndexerEvent::InitializationDone);
    }

    pub fn pause(&self) -> Result<(), IndexerError> {
        self.unsupported("Pausing the indexing is not supported")
    }

    pub fn resume(&self) -> Result<(), IndexerError> {
        self.unsupported("Resuming the indexing is not supported")
    }

    fn unsupported(&self, message: &str) -> Result<(), IndexerError> {
        tracing::warn!("{}", message);
        self.events.error(ErrorKind::InvalidOperation, message);
        Err(IndexerError::UnsupportedOperation(message.to_string()))
    }

    pub fn state(&self) -> IndexerState {
        self.state.get()
    }

    /// Requests waiting behind the running scan.
    pub fn pending(&self) -> Vec<ScanRequest> {
        self.scheduler.pending()
    }

    pub fn is_scanning(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexerEvent> {
        self.events.subscribe()
    }

    /// Abort the running scan at its next file.
    ///
    /// Shutdown is permanent: scans started afterwards abort on their first file.
    pub fn shutdown(&self) {
        tracing::info!("Media indexer shutting down");
        self.cancel.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

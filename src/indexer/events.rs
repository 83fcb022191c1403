//! Indexer notifications.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::broadcast;

use super::state::IndexerState;
use crate::error::ErrorKind;

/// Notification published to indexer observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexerEvent {
    /// The lifecycle state changed.
    StateChanged { state: IndexerState },
    /// Fraction of the current folder processed, `0.0..=1.0`.
    ProgressChanged { progress: f64 },
    /// The scan queue drained.
    IndexingDone,
    /// An operation failed or a scan chain ended in failure.
    ErrorChanged { kind: ErrorKind, message: String },
    /// `initialize` finished.
    InitializationDone,
    /// A queued request was picked up by the worker.
    ScanStarted { folder: PathBuf, removal: bool },
}

/// Broadcast channel shared by the scheduler, worker and state controller.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IndexerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexerEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: IndexerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, progress: f64) {
        self.emit(IndexerEvent::ProgressChanged { progress });
    }

    pub fn error(&self, kind: ErrorKind, message: impl Into<String>) {
        self.emit(IndexerEvent::ErrorChanged {
            kind,
            message: message.into(),
        });
    }
}

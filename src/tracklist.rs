//! Track-list sink.
//!
//! The downstream consumer that receives the URIs of each completed scan.

use parking_lot::Mutex;

/// Receives the results of a scan.
///
/// The indexer calls [`clear`](TrackListSink::clear) once when a scan starts
/// and [`add`](TrackListSink::add) once with the whole batch when it finishes.
/// Only one scan runs at a time, so implementations never see interleaved calls.
pub trait TrackListSink: Send + Sync {
    /// Drop every track currently in the list.
    fn clear(&self);

    /// Insert `uris` into the list starting at `position`.
    fn add(&self, uris: &[String], position: usize);
}

/// A command received by an [`InMemoryTrackList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackListCommand {
    Clear,
    Add { uris: Vec<String>, position: usize },
}

/// Track list held in memory, recording every command it receives.
#[derive(Debug, Default)]
pub struct InMemoryTrackList {
    tracks: Mutex<Vec<String>>,
    commands: Mutex<Vec<TrackListCommand>>,
}

impl InMemoryTrackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the list.
    pub fn tracks(&self) -> Vec<String> {
        self.tracks.lock().clone()
    }

    /// Every command received so far, oldest first.
    pub fn commands(&self) -> Vec<TrackListCommand> {
        self.commands.lock().clone()
    }
}

impl TrackListSink for InMemoryTrackList {
    fn clear(&self) {
        self.tracks.lock().clear();
        self.commands.lock().push(TrackListCommand::Clear);
    }

    fn add(&self, uris: &[String], position: usize) {
        {
            let mut tracks = self.tracks.lock();
            let at = position.min(tracks.len());
            tracks.splice(at..at, uris.iter().cloned());
        }
        self.commands.lock().push(TrackListCommand::Add {
            uris: uris.to_vec(),
            position,
        });
    }
}

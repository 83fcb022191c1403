//! Indexer lifecycle state.

use parking_lot::Mutex;
use serde::Serialize;

use super::events::{EventBus, IndexerEvent};

/// Coarse lifecycle state reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerState {
    /// Nothing queued or running.
    #[default]
    Idle,
    /// A scan, or a chain of queued scans, is in progress.
    Active,
    /// The last scan chain ended with a failed scan.
    Error,
}

/// Holds the current state and publishes transitions.
#[derive(Debug)]
pub struct StateController {
    state: Mutex<IndexerState>,
    events: EventBus,
}

impl StateController {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Mutex::new(IndexerState::Idle),
            events,
        }
    }

    pub fn get(&self) -> IndexerState {
        *self.state.lock()
    }

    /// Move to `state`, notifying observers if it differs from the current one.
    ///
    /// Returns whether a transition happened.
    pub fn set(&self, state: IndexerState) -> bool {
        let mut current = self.state.lock();
        if *current == state {
            return false;
        }
        tracing::debug!("Indexer state {:?} -> {:?}", *current, state);
        *current = state;
        self.events.emit(IndexerEvent::StateChanged { state });
        true
    }

    /// Resolve the state once the queue has drained.
    pub fn resolve(&self, succeeded: bool) {
        self.set(if succeeded {
            IndexerState::Idle
        } else {
            IndexerState::Error
        });
    }

    /// Re-send the current state without changing it.
    pub fn republish(&self) {
        let state = self.get();
        self.events.emit(IndexerEvent::StateChanged { state });
    }
}

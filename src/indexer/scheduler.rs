//! Scan queue and single-worker execution.
//!
//! Requests are serviced strictly in submission order. A one-permit semaphore
//! is the execution slot: whoever holds the permit owns the running scan, and
//! the permit is handed from one chained scan to the next until the queue is
//! empty.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use super::events::{EventBus, IndexerEvent};
use super::state::{IndexerState, StateController};
use super::worker::{ScanOutcome, ScanRequest, ScanWorker};
use crate::error::ErrorKind;

pub struct ScanScheduler {
    pending: Mutex<VecDeque<ScanRequest>>,
    slot: Arc<Semaphore>,
    worker: Arc<ScanWorker>,
    state: Arc<StateController>,
    events: EventBus,
    cancel: CancellationToken,
    runtime: Handle,
}

impl ScanScheduler {
    pub fn new(
        worker: ScanWorker,
        state: Arc<StateController>,
        events: EventBus,
        cancel: CancellationToken,
        runtime: Handle,
    ) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            slot: Arc::new(Semaphore::new(1)),
            worker: Arc::new(worker),
            state,
            events,
            cancel,
            runtime,
        }
    }

    /// Queue a request, starting it right away if no scan is running.
    pub fn enqueue(self: &Arc<Self>, request: ScanRequest) {
        let mut pending = self.pending.lock();
        pending.push_back(request);

        let Ok(permit) = self.slot.clone().try_acquire_owned() else {
            tracing::debug!("Scan in progress, {} request(s) queued", pending.len());
            return;
        };
        if let Some(next) = pending.pop_front() {
            self.start(next, permit);
        }
    }

    /// Requests waiting behind the running scan, oldest first.
    pub fn pending(&self) -> Vec<ScanRequest> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Whether a scan currently holds the execution slot.
    pub fn is_running(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// Hand `request` to the worker on the blocking pool.
    fn start(self: &Arc<Self>, request: ScanRequest, permit: OwnedSemaphorePermit) {
        self.state.set(IndexerState::Active);

        let scheduler = Arc::clone(self);
        let worker = Arc::clone(&self.worker);
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            let folder = request.folder.clone();
            let outcome = tokio::task::spawn_blocking(move || worker.run(&request, &cancel))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Scan task for {} panicked: {}", folder.display(), e);
                    ScanOutcome::default()
                });
            scheduler.on_worker_finished(outcome, permit);
        });
    }

    /// Chain the next request, or finalize once the queue is empty.
    fn on_worker_finished(self: &Arc<Self>, outcome: ScanOutcome, permit: OwnedSemaphorePermit) {
        let mut pending = self.pending.lock();
        if let Some(next) = pending.pop_front() {
            self.start(next, permit);
            return;
        }

        tracing::info!("Scanning done");
        self.events.progress(1.0);
        self.events.emit(IndexerEvent::IndexingDone);

        if !outcome.succeeded {
            tracing::error!("Indexing finished with a failed scan");
            self.events
                .error(ErrorKind::ChainFailure, "The last scan did not complete");
        }
        self.state.resolve(outcome.succeeded);

        // Slot is freed under the queue lock, after the state has been resolved.
        drop(permit);
        drop(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::worker::tests::{FakeExtractor, write_files};
    use crate::indexer::worker::file_uri;
    use crate::scanner::FolderWalker;
    use crate::tracklist::{InMemoryTrackList, TrackListCommand};
    use std::time::Duration;
    use tokio::sync::broadcast::Receiver;

    struct Harness {
        scheduler: Arc<ScanScheduler>,
        state: Arc<StateController>,
        sink: Arc<InMemoryTrackList>,
        rx: Receiver<IndexerEvent>,
    }

    fn harness(extractor: FakeExtractor, cancel: CancellationToken) -> Harness {
        let events = EventBus::new(1024);
        let rx = events.subscribe();
        let state = Arc::new(StateController::new(events.clone()));
        let sink = Arc::new(InMemoryTrackList::new());
        let worker = ScanWorker::new(
            FolderWalker::new(&["mp3".to_string()]),
            &["mp3".to_string()],
            Arc::new(extractor),
            sink.clone(),
            state.clone(),
            events.clone(),
        );
        let scheduler = Arc::new(ScanScheduler::new(
            worker,
            state.clone(),
            events,
            cancel,
            Handle::current(),
        ));
        Harness {
            scheduler,
            state,
            sink,
            rx,
        }
    }

    /// Collect events up to `IndexingDone` plus whatever finalization emitted after it.
    async fn until_done(rx: &mut Receiver<IndexerEvent>) -> Vec<IndexerEvent> {
        let mut seen = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for indexing to finish")
                .unwrap();
            let done = event == IndexerEvent::IndexingDone;
            seen.push(event);
            if done {
                break;
            }
        }
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        seen
    }

    fn state_changes(events: &[IndexerEvent]) -> Vec<IndexerState> {
        events
            .iter()
            .filter_map(|e| match e {
                IndexerEvent::StateChanged { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_requests_run_in_fifo_order() {
        let dirs: Vec<_> = (0..3).map(|_| tempfile::tempdir().unwrap()).collect();
        for dir in &dirs {
            write_files(dir.path(), &["track.mp3"]);
        }
        let mut h = harness(FakeExtractor::default(), CancellationToken::new());

        h.scheduler.enqueue(ScanRequest::add(dirs[0].path()));
        h.scheduler.enqueue(ScanRequest::remove(dirs[1].path()));
        h.scheduler.enqueue(ScanRequest::add(dirs[2].path()));

        assert!(h.scheduler.is_running());
        assert_eq!(
            h.scheduler.pending(),
            vec![
                ScanRequest::remove(dirs[1].path()),
                ScanRequest::add(dirs[2].path())
            ]
        );

        let events = until_done(&mut h.rx).await;
        let started: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                IndexerEvent::ScanStarted { folder, .. } => Some(folder.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<_> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
        assert_eq!(started, expected);

        let batches: Vec<_> = h
            .sink
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                TrackListCommand::Add { uris, .. } => Some(uris),
                _ => None,
            })
            .collect();
        let expected_batches: Vec<_> = dirs
            .iter()
            .map(|d| vec![file_uri(&d.path().join("track.mp3"))])
            .collect();
        assert_eq!(batches, expected_batches);
    }

    #[tokio::test]
    async fn test_state_stays_active_across_chain() {
        let dirs: Vec<_> = (0..3).map(|_| tempfile::tempdir().unwrap()).collect();
        for dir in &dirs {
            write_files(dir.path(), &["1.mp3", "2.mp3"]);
        }
        let mut h = harness(FakeExtractor::default(), CancellationToken::new());

        for dir in &dirs {
            h.scheduler.enqueue(ScanRequest::add(dir.path()));
        }
        assert_eq!(h.state.get(), IndexerState::Active);

        let events = until_done(&mut h.rx).await;
        assert_eq!(
            state_changes(&events),
            vec![IndexerState::Active, IndexerState::Idle]
        );

        // Scans never interleave: every clear is followed by its own append.
        let commands = h.sink.commands();
        assert_eq!(commands.len(), 6);
        for pair in commands.chunks(2) {
            assert_eq!(pair[0], TrackListCommand::Clear);
            assert!(matches!(pair[1], TrackListCommand::Add { .. }));
        }
        assert!(!h.scheduler.is_running());
        assert_eq!(h.state.get(), IndexerState::Idle);
    }

    #[tokio::test]
    async fn test_progress_restarts_per_folder() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_files(first.path(), &["1.mp3", "2.mp3"]);
        write_files(second.path(), &["1.mp3", "2.mp3", "3.mp3", "4.mp3"]);
        let mut h = harness(FakeExtractor::default(), CancellationToken::new());

        h.scheduler.enqueue(ScanRequest::add(first.path()));
        h.scheduler.enqueue(ScanRequest::add(second.path()));

        let events = until_done(&mut h.rx).await;
        let progress: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                IndexerEvent::ProgressChanged { progress } => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(
            progress,
            vec![0.0, 0.5, 1.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0]
        );
    }

    #[tokio::test]
    async fn test_failed_last_scan_ends_in_error() {
        let ok = tempfile::tempdir().unwrap();
        let doomed = tempfile::tempdir().unwrap();
        write_files(ok.path(), &["1.mp3"]);
        write_files(doomed.path(), &["1.mp3", "2.mp3"]);

        // The second extraction trips shutdown, so the second folder aborts.
        let cancel = CancellationToken::new();
        let extractor = FakeExtractor {
            cancel_after: Some((2, cancel.clone())),
            ..Default::default()
        };
        let mut h = harness(extractor, cancel);

        h.scheduler.enqueue(ScanRequest::add(ok.path()));
        h.scheduler.enqueue(ScanRequest::add(doomed.path()));

        let events = until_done(&mut h.rx).await;
        assert_eq!(h.state.get(), IndexerState::Error);
        assert!(events.contains(&IndexerEvent::ErrorChanged {
            kind: ErrorKind::ChainFailure,
            message: "The last scan did not complete".into()
        }));
        assert_eq!(
            state_changes(&events),
            vec![IndexerState::Active, IndexerState::Error]
        );
        // Only the first folder reached the sink.
        let adds = h
            .sink
            .commands()
            .into_iter()
            .filter(|c| matches!(c, TrackListCommand::Add { .. }))
            .count();
        assert_eq!(adds, 1);
    }

    #[tokio::test]
    async fn test_error_clears_after_successful_chain() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &["1.mp3"]);
        let mut h = harness(FakeExtractor::default(), CancellationToken::new());
        h.state.set(IndexerState::Error);

        h.scheduler.enqueue(ScanRequest::add(dir.path()));
        let events = until_done(&mut h.rx).await;

        assert_eq!(
            state_changes(&events),
            vec![
                IndexerState::Error,
                IndexerState::Active,
                IndexerState::Idle
            ]
        );
    }

    #[tokio::test]
    async fn test_enqueue_after_drain_starts_new_scan() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &["1.mp3"]);
        let mut h = harness(FakeExtractor::default(), CancellationToken::new());

        h.scheduler.enqueue(ScanRequest::add(dir.path()));
        until_done(&mut h.rx).await;
        h.scheduler.enqueue(ScanRequest::add(dir.path()));
        assert!(h.scheduler.is_running());
        assert!(h.scheduler.pending().is_empty());
        until_done(&mut h.rx).await;

        let clears = h
            .sink
            .commands()
            .into_iter()
            .filter(|c| *c == TrackListCommand::Clear)
            .count();
        assert_eq!(clears, 2);
    }
}

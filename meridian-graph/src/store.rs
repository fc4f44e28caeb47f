//! Owned, disposable state container for one live view.
//!
//! The store is the only mutation entry point: frames go in through
//! `ingest*`, readers get immutable [`GraphSnapshot`]s through
//! [`GraphStore::snapshot`] or a [`watch`] subscription.

use crate::citations::DEFAULT_CITATION_CAPACITY;
use crate::snapshot::GraphSnapshot;
use crate::state::{ApplyOutcome, GraphState};
use meridian_core::{NormalizedEvent, RequestStatus};
use meridian_events::{EventLog, Normalizer, PollBatch, DEFAULT_EVENT_LOG_CAPACITY};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

/// What happened to one ingested frame or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Applied,
    Duplicate,
    /// Normalizer rejected the frame
    Dropped,
    /// Store was disposed; nothing was folded
    Disposed,
}

/// Shared liveness flag. Cleared once, never set again.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Capacities for the bounded side buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub event_log_capacity: usize,
    pub citation_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            citation_capacity: DEFAULT_CITATION_CAPACITY,
        }
    }
}

#[derive(Debug)]
pub struct GraphStore {
    state: GraphState,
    log: EventLog,
    normalizer: Normalizer,
    liveness: Liveness,
    snapshots: watch::Sender<Arc<GraphSnapshot>>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl GraphStore {
    pub fn new(options: StoreOptions) -> Self {
        Self::with_normalizer(options, Normalizer::new())
    }

    pub fn with_normalizer(options: StoreOptions, normalizer: Normalizer) -> Self {
        let state = GraphState::new(options.citation_capacity);
        let (snapshots, _) = watch::channel(Arc::new(state.snapshot()));
        Self {
            state,
            log: EventLog::new(options.event_log_capacity),
            normalizer,
            liveness: Liveness::new(),
            snapshots,
        }
    }

    /// Normalize and fold one decoded frame.
    pub fn ingest_raw(&mut self, raw: &Value) -> IngestOutcome {
        if !self.liveness.is_alive() {
            return IngestOutcome::Disposed;
        }
        match self.normalizer.normalize(raw) {
            Some(event) => self.ingest(&event),
            None => IngestOutcome::Dropped,
        }
    }

    /// Decode, normalize and fold one text frame.
    pub fn ingest_text(&mut self, text: &str) -> IngestOutcome {
        if !self.liveness.is_alive() {
            return IngestOutcome::Disposed;
        }
        match self.normalizer.normalize_text(text) {
            Some(event) => self.ingest(&event),
            None => IngestOutcome::Dropped,
        }
    }

    /// Fold the synthetic events of one poll response, then its terminal
    /// request status if it reports one.
    pub fn ingest_poll(&mut self, batch: &PollBatch) -> Vec<IngestOutcome> {
        let outcomes: Vec<_> = batch.events.iter().map(|event| self.ingest(event)).collect();
        if let Some(status) = batch.request_status {
            self.finish(status);
        }
        outcomes
    }

    /// Record a terminal request status from the transport. Publishes a
    /// new snapshot only when the status changed.
    pub fn finish(&mut self, status: RequestStatus) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        let changed = self.state.finish(status);
        if changed {
            self.publish();
        }
        changed
    }

    /// Fold an already normalized event.
    pub fn ingest(&mut self, event: &NormalizedEvent) -> IngestOutcome {
        if !self.liveness.is_alive() {
            trace!(kind = %event.kind(), "Store disposed, event discarded");
            return IngestOutcome::Disposed;
        }
        match self.state.apply(event) {
            ApplyOutcome::Applied => {
                self.log.append(event);
                self.publish();
                IngestOutcome::Applied
            }
            ApplyOutcome::Duplicate => IngestOutcome::Duplicate,
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every fold that changed state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphSnapshot>> {
        self.snapshots.subscribe()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn request_status(&self) -> RequestStatus {
        self.state.request_status()
    }

    /// Handle that can dispose the store from another task.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Refuse every later ingest.
    pub fn dispose(&self) {
        if self.liveness.is_alive() {
            debug!(version = self.state.version(), "Disposing graph store");
        }
        self.liveness.dispose();
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.state.snapshot()));
    }
}

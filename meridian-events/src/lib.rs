//! Meridian Events - Normalization and Activity Log
//!
//! Turns loosely-typed transport frames into [`NormalizedEvent`]s and keeps
//! the bounded, arrival-ordered activity stream shown next to the graph.
//!
//! # Flow
//!
//! ```text
//! frame (JSON) ──normalize──▶ NormalizedEvent ──┬──▶ graph synchronizer
//!                                               └──▶ EventLog (last N)
//! poll response ──events_from_poll──▶ [status_update, ...]
//! ```
//!
//! The normalizer never fails loudly: frames it cannot use are reported to a
//! [`DiagnosticSink`] and dropped.

mod fingerprint;
mod log;
mod normalizer;
mod poll;

pub use fingerprint::{fingerprint, EventFingerprint, ReplayKey};
pub use log::{EventLog, LogEntry, RingBuffer, DEFAULT_EVENT_LOG_CAPACITY};
pub use normalizer::{
    normalize, normalize_text, DiagnosticSink, DropReason, Normalizer, TracingDiagnostics,
};
pub use poll::{events_from_poll, PollBatch, PollProgress, PollResponse};

pub use meridian_core::{EventKind, EventPayload, NormalizedEvent};

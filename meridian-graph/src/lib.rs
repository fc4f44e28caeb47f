//! Meridian Graph - Live Agent-Execution Graph Synchronizer
//!
//! Folds a stream of [`NormalizedEvent`]s about named agents into a
//! consistent node/edge graph, tolerating duplicates, reordering across
//! reconnects and references to agents not yet seen.
//!
//! # Layers
//!
//! - [`GraphState`]: the fold itself (`apply`), hierarchy inference and
//!   derived aggregates
//! - [`GraphStore`]: the owned container a live view holds, with the
//!   activity log, liveness flag and snapshot publication
//! - [`GraphSnapshot`]: what renderers read, never mutated after publication

mod aggregate;
mod citations;
mod hierarchy;
mod snapshot;
mod state;
mod store;

pub use aggregate::Aggregates;
pub use citations::{CitationLog, CitationRecord, DEFAULT_CITATION_CAPACITY};
pub use hierarchy::{classify, Placement};
pub use snapshot::GraphSnapshot;
pub use state::{ApplyOutcome, GraphState, DURATION_TICK_SECS};
pub use store::{GraphStore, IngestOutcome, Liveness, StoreOptions};

pub use meridian_core::NormalizedEvent;

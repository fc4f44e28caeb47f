//! Bounded list of cited sources, kept beside the graph.

use meridian_core::{AgentId, Citation};
use meridian_events::RingBuffer;
use serde::{Deserialize, Serialize};

/// Sources kept by default.
pub const DEFAULT_CITATION_CAPACITY: usize = 200;

/// One cited source and who cited it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub agent_id: Option<AgentId>,
    pub timestamp: String,
    pub citation: Citation,
}

pub type CitationLog = RingBuffer<CitationRecord>;

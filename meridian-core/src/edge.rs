//! Edge entity connecting two agent nodes.

use crate::{AgentId, EdgeStatus, EdgeType};
use serde::{Deserialize, Serialize};

/// Identity of an edge. At most one edge exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source_id: AgentId,
    pub target_id: AgentId,
    pub edge_type: EdgeType,
}

/// A delegation or dependency relationship between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: AgentId,
    pub target_id: AgentId,
    pub edge_type: EdgeType,
    pub status: EdgeStatus,
    /// Task text from the delegation that created or last touched the edge.
    pub task: Option<String>,
}

impl Edge {
    pub fn new(
        source_id: impl Into<AgentId>,
        target_id: impl Into<AgentId>,
        edge_type: EdgeType,
        status: EdgeStatus,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type,
            status,
            task: None,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source_id: self.source_id.clone(),
            target_id: self.target_id.clone(),
            edge_type: self.edge_type,
        }
    }
}

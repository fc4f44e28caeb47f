//! Immutable, versioned view of the graph handed to renderers.

use crate::aggregate::Aggregates;
use crate::citations::CitationRecord;
use meridian_core::{AgentId, AgentNode, Edge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Bumped once per applied event or request-status change
    pub version: u64,
    pub nodes: BTreeMap<AgentId, AgentNode>,
    /// Insertion order
    pub edges: Vec<Edge>,
    pub aggregates: Aggregates,
    /// Oldest first
    pub citations: Vec<CitationRecord>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&AgentNode> {
        self.nodes.get(id)
    }

    /// Edges whose endpoints both exist.
    pub fn resolved_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(move |e| {
                self.nodes.contains_key(&e.source_id) && self.nodes.contains_key(&e.target_id)
            })
    }

    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a AgentNode> + 'a {
        self.nodes
            .values()
            .filter(move |n| n.parent_id.as_deref() == Some(id))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

//! Agent node entity.

use crate::{AgentId, AgentKind, AgentStatus};
use serde::{Deserialize, Serialize};

/// Per-agent metrics accumulated from the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentMetrics {
    /// Last reported confidence in `0.0..=1.0`
    pub confidence: Option<f64>,
    /// Coarse elapsed-work approximation, only ever grows
    pub duration_secs: f64,
    /// Citations attributed to this agent
    pub citation_count: u32,
}

/// A named agent rendered as one node of the execution graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: AgentId,
    pub display_name: String,
    pub kind: AgentKind,
    pub status: AgentStatus,
    /// Weak back-reference used for hierarchy rendering only.
    pub parent_id: Option<AgentId>,
    pub parallel_group: Option<String>,
    pub metrics: AgentMetrics,
    pub last_message: Option<String>,
}

impl AgentNode {
    /// A fresh idle node with the given kind and parent.
    pub fn new(id: impl Into<AgentId>, kind: AgentKind, parent_id: Option<AgentId>) -> Self {
        let id = id.into();
        Self {
            display_name: display_name_from_id(&id),
            id,
            kind,
            status: AgentStatus::Idle,
            parent_id,
            parallel_group: None,
            metrics: AgentMetrics::default(),
            last_message: None,
        }
    }
}

/// Human label for an agent id: separators become spaces.
///
/// `"Research_Analyst_3"` → `"Research Analyst 3"`.
pub fn display_name_from_id(id: &str) -> String {
    let spaced: String = id
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

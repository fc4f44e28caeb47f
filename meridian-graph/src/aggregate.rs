//! Derived counters shown in the header and the agents view.

use meridian_core::{AgentNode, AgentStatus, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregates over the current node set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregates {
    /// Nodes per status. Statuses with no nodes are absent.
    pub counts: BTreeMap<AgentStatus, usize>,
    pub total: usize,
    /// Distinct parallel-group tags carried by any node
    pub parallel_groups: BTreeSet<String>,
    pub request_status: RequestStatus,
}

impl Aggregates {
    pub fn compute<'a>(
        nodes: impl IntoIterator<Item = &'a AgentNode>,
        request_status: RequestStatus,
    ) -> Self {
        let mut aggregates = Aggregates {
            request_status,
            ..Aggregates::default()
        };
        for node in nodes {
            *aggregates.counts.entry(node.status).or_insert(0) += 1;
            aggregates.total += 1;
            if let Some(group) = &node.parallel_group {
                aggregates.parallel_groups.insert(group.clone());
            }
        }
        aggregates
    }

    pub fn count(&self, status: AgentStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Nodes in any working status (active, thinking, searching, analyzing).
    pub fn running(&self) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.is_working())
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn completed(&self) -> usize {
        self.count(AgentStatus::Completed)
    }
}

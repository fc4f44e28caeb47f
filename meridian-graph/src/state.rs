//! Graph State Synchronizer.
//!
//! [`GraphState::apply`] folds one [`NormalizedEvent`] into the node and
//! edge maps. Fold order is arrival order; event timestamps are never
//! consulted. Each call either applies the whole event or, for an event
//! identical to the last one applied to the same agent or edge, nothing
//! at all. Only that last fingerprint is kept per key, so memory grows
//! with the graph rather than with the stream.

use crate::aggregate::Aggregates;
use crate::citations::{CitationLog, CitationRecord, DEFAULT_CITATION_CAPACITY};
use crate::hierarchy::classify;
use crate::snapshot::GraphSnapshot;
use meridian_core::{
    AgentId, AgentMetrics, AgentNode, AgentStatus, Citation, Edge, EdgeKey, EdgeStatus, EdgeType,
    EventPayload, NormalizedEvent, ProgressKind, RequestStatus, SyncedAgent,
};
use meridian_events::{fingerprint, EventFingerprint, ReplayKey};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Work credited to a node per distinct status update while not completed.
pub const DURATION_TICK_SECS: f64 = 1.0;

/// Message text that forces a node to `completed`, matched case-insensitively.
const COMPLETION_MARKER: &str = "completed";

/// Result of folding one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Same as the last event applied to its key; state untouched
    Duplicate,
}

/// Canonical node/edge state for one analysis request.
#[derive(Debug, Clone)]
pub struct GraphState {
    nodes: BTreeMap<AgentId, AgentNode>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeKey, usize>,
    citations: CitationLog,
    last_applied: HashMap<ReplayKey, EventFingerprint>,
    error_seen: bool,
    synced_status: Option<RequestStatus>,
    version: u64,
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new(DEFAULT_CITATION_CAPACITY)
    }
}

impl GraphState {
    pub fn new(citation_capacity: usize) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            citations: CitationLog::new(citation_capacity),
            last_applied: HashMap::new(),
            error_seen: false,
            synced_status: None,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node(&self, id: &str) -> Option<&AgentNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AgentNode> {
        self.nodes.values()
    }

    /// Insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, source: &str, target: &str, edge_type: EdgeType) -> Option<&Edge> {
        let key = EdgeKey {
            source_id: source.to_string(),
            target_id: target.to_string(),
            edge_type,
        };
        self.edge_index.get(&key).map(|&i| &self.edges[i])
    }

    pub fn citations(&self) -> &CitationLog {
        &self.citations
    }

    pub fn request_status(&self) -> RequestStatus {
        if self.error_seen {
            return RequestStatus::Error;
        }
        let all_completed = !self.nodes.is_empty()
            && self
                .nodes
                .values()
                .all(|n| n.status == AgentStatus::Completed);
        if all_completed || self.synced_status == Some(RequestStatus::Completed) {
            RequestStatus::Completed
        } else {
            RequestStatus::Active
        }
    }

    pub fn aggregates(&self) -> Aggregates {
        Aggregates::compute(self.nodes.values(), self.request_status())
    }

    /// Copy the current state into an immutable snapshot.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            version: self.version,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            aggregates: self.aggregates(),
            citations: self.citations.iter().cloned().collect(),
        }
    }

    /// Fold one event into the graph.
    pub fn apply(&mut self, event: &NormalizedEvent) -> ApplyOutcome {
        let key = ReplayKey::of(event);
        let print = fingerprint(event);
        if self.last_applied.get(&key) == Some(&print) {
            trace!(kind = %event.kind(), "Skipping replayed event");
            return ApplyOutcome::Duplicate;
        }

        match &event.payload {
            EventPayload::StatusUpdate {
                agent_id,
                status,
                message,
                confidence,
                parallel_group,
            } => self.apply_status(
                agent_id,
                *status,
                message.as_deref(),
                *confidence,
                parallel_group.as_deref(),
            ),
            EventPayload::Delegation {
                from,
                to,
                task,
                status,
                edge_type,
            } => self.apply_delegation(from, to, task.as_deref(), *status, *edge_type),
            EventPayload::Citation {
                agent_id,
                citations,
            } => self.apply_citations(agent_id.as_deref(), citations, &event.timestamp),
            EventPayload::GenericProgress {
                agent_id,
                progress,
                message,
            } => self.apply_progress(agent_id.as_deref(), *progress, message),
            EventPayload::Error { agent_id, message } => {
                self.apply_error(agent_id.as_deref(), message)
            }
            EventPayload::FullSync {
                agents,
                request_status,
            } => self.apply_full_sync(agents, *request_status),
        }

        self.last_applied.insert(key, print);
        self.version += 1;
        trace!(
            kind = %event.kind(),
            version = self.version,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Applied event"
        );
        ApplyOutcome::Applied
    }

    // ========================================================================
    // PER-KIND FOLDS
    // ========================================================================

    fn apply_status(
        &mut self,
        agent_id: &str,
        status: AgentStatus,
        message: Option<&str>,
        confidence: Option<f64>,
        parallel_group: Option<&str>,
    ) {
        self.ensure_node(agent_id, None);
        let Some(node) = self.nodes.get_mut(agent_id) else {
            return;
        };

        if node.status != AgentStatus::Completed {
            node.metrics.duration_secs += DURATION_TICK_SECS;
        }

        let completed_by_message = message
            .map(|m| m.to_lowercase().contains(COMPLETION_MARKER))
            .unwrap_or(false);
        node.status = if completed_by_message {
            AgentStatus::Completed
        } else {
            status
        };
        if let Some(confidence) = confidence {
            node.metrics.confidence = Some(confidence);
        }
        if let Some(message) = message {
            node.last_message = Some(message.to_string());
        }
        if let Some(group) = parallel_group {
            node.parallel_group = Some(group.to_string());
        }
    }

    fn apply_delegation(
        &mut self,
        from: &str,
        to: &str,
        task: Option<&str>,
        status: EdgeStatus,
        edge_type: EdgeType,
    ) {
        self.ensure_node(from, None);
        if from == to {
            debug!(agent_id = %from, "Ignoring self-delegation edge");
            return;
        }
        self.ensure_node(to, Some(from));
        if let Some(child) = self.nodes.get_mut(to) {
            child.parent_id = Some(from.to_string());
        }
        self.upsert_edge(from, to, edge_type, status, task);
    }

    fn apply_citations(&mut self, agent_id: Option<&str>, citations: &[Citation], timestamp: &str) {
        if let Some(node) = agent_id.and_then(|id| self.nodes.get_mut(id)) {
            node.metrics.citation_count = node
                .metrics
                .citation_count
                .saturating_add(citations.len() as u32);
        }
        for citation in citations {
            self.citations.push(CitationRecord {
                agent_id: agent_id.map(str::to_string),
                timestamp: timestamp.to_string(),
                citation: citation.clone(),
            });
        }
    }

    fn apply_progress(&mut self, agent_id: Option<&str>, progress: ProgressKind, message: &str) {
        let Some(agent_id) = agent_id else {
            return;
        };
        self.ensure_node(agent_id, None);
        if let Some(node) = self.nodes.get_mut(agent_id) {
            if node.status == AgentStatus::Idle {
                node.status = AgentStatus::Active;
            }
            node.last_message = Some(format!("{}: {}", progress, message));
        }
    }

    fn apply_error(&mut self, agent_id: Option<&str>, message: &str) {
        self.error_seen = true;
        let Some(agent_id) = agent_id else {
            return;
        };
        self.ensure_node(agent_id, None);
        if let Some(node) = self.nodes.get_mut(agent_id) {
            node.status = AgentStatus::Error;
            node.last_message = Some(message.to_string());
        }
    }

    fn apply_full_sync(&mut self, agents: &[SyncedAgent], request_status: Option<RequestStatus>) {
        debug!(
            agents = agents.len(),
            dropped = self.nodes.len(),
            "Rebuilding nodes from full sync"
        );
        self.nodes.clear();
        for agent in agents {
            let placement = classify(&agent.id);
            let parent_id = agent
                .parent_id
                .clone()
                .or(placement.parent_id)
                .filter(|parent| parent != &agent.id);
            let mut node = AgentNode::new(
                agent.id.clone(),
                agent.kind.unwrap_or(placement.kind),
                parent_id,
            );
            node.status = agent.status;
            node.parallel_group = agent.parallel_group.clone();
            node.metrics = AgentMetrics {
                confidence: agent.confidence,
                duration_secs: agent.duration_secs,
                citation_count: agent.citation_count,
            };
            self.nodes.insert(agent.id.clone(), node);
        }

        let implied: Vec<(AgentId, AgentId)> = self
            .nodes
            .values()
            .filter_map(|n| n.parent_id.clone().map(|p| (p, n.id.clone())))
            .filter(|(parent, _)| self.nodes.contains_key(parent))
            .collect();
        for (parent, child) in implied {
            self.insert_structural_edge(&parent, &child);
        }

        if let Some(status) = request_status {
            self.record_request_status(status);
        }
    }

    /// Fold a terminal request status reported outside the event stream,
    /// by a poll response or a completion frame. Returns false when the
    /// status is not terminal or already in effect.
    pub fn finish(&mut self, status: RequestStatus) -> bool {
        if !status.is_terminal() || self.request_status() == status {
            return false;
        }
        debug!(status = %status, "Request finished");
        self.record_request_status(status);
        self.version += 1;
        true
    }

    fn record_request_status(&mut self, status: RequestStatus) {
        self.error_seen = status == RequestStatus::Error;
        self.synced_status = Some(status);
    }

    // ========================================================================
    // NODE AND EDGE UPSERTS
    // ========================================================================

    /// Create `id` if unseen, placing it under `parent` or the inferred parent.
    fn ensure_node(&mut self, id: &str, parent: Option<&str>) {
        if self.nodes.contains_key(id) {
            return;
        }
        let placement = classify(id);
        let parent_id = parent
            .map(str::to_string)
            .or(placement.parent_id)
            .filter(|p| p != id);
        debug!(
            agent_id = %id,
            kind = %placement.kind,
            parent_id = parent_id.as_deref().unwrap_or("-"),
            "Created agent node"
        );
        self.nodes.insert(
            id.to_string(),
            AgentNode::new(id, placement.kind, parent_id.clone()),
        );

        if let Some(parent) = parent_id.filter(|p| self.nodes.contains_key(p)) {
            self.insert_structural_edge(&parent, id);
        }
        let orphans: Vec<AgentId> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .map(|n| n.id.clone())
            .collect();
        for child in orphans {
            self.insert_structural_edge(id, &child);
        }
    }

    /// Pending dependency edge implied by the hierarchy. Never touches an
    /// existing edge.
    fn insert_structural_edge(&mut self, parent: &str, child: &str) {
        let key = EdgeKey {
            source_id: parent.to_string(),
            target_id: child.to_string(),
            edge_type: EdgeType::Dependency,
        };
        if self.edge_index.contains_key(&key) {
            return;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(Edge::new(
            parent,
            child,
            EdgeType::Dependency,
            EdgeStatus::Pending,
        ));
    }

    fn upsert_edge(
        &mut self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
        status: EdgeStatus,
        task: Option<&str>,
    ) {
        let key = EdgeKey {
            source_id: source.to_string(),
            target_id: target.to_string(),
            edge_type,
        };
        match self.edge_index.get(&key) {
            Some(&i) => {
                let edge = &mut self.edges[i];
                edge.status = status;
                if let Some(task) = task {
                    edge.task = Some(task.to_string());
                }
            }
            None => {
                let mut edge = Edge::new(source, target, edge_type, status);
                edge.task = task.map(str::to_string);
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
    }
}

//! Normalized event records.
//!
//! Every inbound frame the normalizer accepts becomes exactly one
//! [`NormalizedEvent`]. Downstream consumers match on [`EventPayload`]
//! exhaustively instead of probing optional fields.

use crate::{AgentId, AgentKind, AgentStatus, EdgeStatus, EdgeType, RequestStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of normalized event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusUpdate,
    Delegation,
    Citation,
    GenericProgress,
    Error,
    FullSync,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StatusUpdate => "status_update",
            EventKind::Delegation => "delegation",
            EventKind::Citation => "citation",
            EventKind::GenericProgress => "generic_progress",
            EventKind::Error => "error",
            EventKind::FullSync => "full_sync",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upstream progress event flavours folded into `generic_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    ToolCall,
    DecisionMade,
    MemoryRecalled,
    PatternDetected,
    InsightGenerated,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::ToolCall => "tool_call",
            ProgressKind::DecisionMade => "decision_made",
            ProgressKind::MemoryRecalled => "memory_recalled",
            ProgressKind::PatternDetected => "pattern_detected",
            ProgressKind::InsightGenerated => "insight_generated",
        }
    }

    /// Map an upstream `type` tag to a progress kind.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "tool_call" => Some(ProgressKind::ToolCall),
            "decision_made" => Some(ProgressKind::DecisionMade),
            "memory_recalled" => Some(ProgressKind::MemoryRecalled),
            "pattern_detected" => Some(ProgressKind::PatternDetected),
            "insight_generated" => Some(ProgressKind::InsightGenerated),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source an agent cited while researching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Citation {
    pub source: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub confidence: Option<f64>,
}

/// One agent entry of a bulk sync message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedAgent {
    pub id: AgentId,
    pub status: AgentStatus,
    pub kind: Option<AgentKind>,
    pub parent_id: Option<AgentId>,
    pub parallel_group: Option<String>,
    pub confidence: Option<f64>,
    pub duration_secs: f64,
    pub citation_count: u32,
}

/// Kind-specific event body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    StatusUpdate {
        agent_id: AgentId,
        status: AgentStatus,
        message: Option<String>,
        confidence: Option<f64>,
        parallel_group: Option<String>,
    },
    Delegation {
        from: AgentId,
        to: AgentId,
        task: Option<String>,
        status: EdgeStatus,
        edge_type: EdgeType,
    },
    Citation {
        agent_id: Option<AgentId>,
        citations: Vec<Citation>,
    },
    GenericProgress {
        agent_id: Option<AgentId>,
        progress: ProgressKind,
        message: String,
    },
    Error {
        agent_id: Option<AgentId>,
        message: String,
    },
    FullSync {
        agents: Vec<SyncedAgent>,
        request_status: Option<RequestStatus>,
    },
}

/// A validated, closed-shape event ready for folding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Upstream event id, when the producer supplies one.
    pub event_id: Option<String>,
    /// Display-ordering only; fold order is arrival order.
    pub timestamp: String,
    /// Set when the frame carried no timestamp and `timestamp` is the
    /// receive time.
    #[serde(default)]
    pub timestamp_inferred: bool,
    pub payload: EventPayload,
}

impl NormalizedEvent {
    pub fn new(timestamp: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            event_id: None,
            timestamp: timestamp.into(),
            timestamp_inferred: false,
            payload,
        }
    }

    /// Event stamped with the receive time rather than an upstream time.
    pub fn received(timestamp: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            timestamp_inferred: true,
            ..Self::new(timestamp, payload)
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::StatusUpdate { .. } => EventKind::StatusUpdate,
            EventPayload::Delegation { .. } => EventKind::Delegation,
            EventPayload::Citation { .. } => EventKind::Citation,
            EventPayload::GenericProgress { .. } => EventKind::GenericProgress,
            EventPayload::Error { .. } => EventKind::Error,
            EventPayload::FullSync { .. } => EventKind::FullSync,
        }
    }

    /// The agent this event is about. Delegations report their target.
    pub fn agent_id(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::StatusUpdate { agent_id, .. } => Some(agent_id),
            EventPayload::Delegation { to, .. } => Some(to),
            EventPayload::Citation { agent_id, .. }
            | EventPayload::GenericProgress { agent_id, .. }
            | EventPayload::Error { agent_id, .. } => agent_id.as_deref(),
            EventPayload::FullSync { .. } => None,
        }
    }

    /// One-line human summary for the activity stream.
    pub fn summary(&self) -> String {
        match &self.payload {
            EventPayload::StatusUpdate {
                agent_id,
                status,
                message,
                ..
            } => match message {
                Some(message) => format!("{} [{}] {}", agent_id, status, message),
                None => format!("{} is {}", agent_id, status),
            },
            EventPayload::Delegation { from, to, task, .. } => match task {
                Some(task) => format!("{} → {}: {}", from, to, task),
                None => format!("{} → {}", from, to),
            },
            EventPayload::Citation {
                agent_id,
                citations,
            } => {
                let who = agent_id.as_deref().unwrap_or("unknown agent");
                match citations.as_slice() {
                    [single] => format!("{} cited {}", who, single.source),
                    many => format!("{} cited {} sources", who, many.len()),
                }
            }
            EventPayload::GenericProgress {
                agent_id,
                progress,
                message,
            } => match agent_id {
                Some(agent_id) => format!("{} {}: {}", agent_id, progress, message),
                None => format!("{}: {}", progress, message),
            },
            EventPayload::Error { agent_id, message } => match agent_id {
                Some(agent_id) => format!("{} error: {}", agent_id, message),
                None => format!("error: {}", message),
            },
            EventPayload::FullSync { agents, .. } => {
                format!("state sync ({} agents)", agents.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(agent: &str, message: Option<&str>) -> NormalizedEvent {
        NormalizedEvent::new(
            "2024-01-01T00:00:00.000Z",
            EventPayload::StatusUpdate {
                agent_id: agent.to_string(),
                status: AgentStatus::Active,
                message: message.map(str::to_string),
                confidence: None,
                parallel_group: None,
            },
        )
    }

    #[test]
    fn test_kind_and_agent() {
        let event = status("CEO", None);
        assert_eq!(event.kind(), EventKind::StatusUpdate);
        assert_eq!(event.agent_id(), Some("CEO"));

        let sync = NormalizedEvent::new(
            "t",
            EventPayload::FullSync {
                agents: Vec::new(),
                request_status: None,
            },
        );
        assert_eq!(sync.kind(), EventKind::FullSync);
        assert_eq!(sync.agent_id(), None);
    }

    #[test]
    fn test_summary_mentions_agent() {
        assert_eq!(status("CEO", None).summary(), "CEO is active");
        assert_eq!(
            status("CEO", Some("planning")).summary(),
            "CEO [active] planning"
        );
    }

    #[test]
    fn test_payload_serializes_with_kind_tag() {
        let json = serde_json::to_value(status("CEO", None)).expect("serialize");
        assert_eq!(json["payload"]["kind"], "status_update");
        assert_eq!(json["payload"]["status"], "active");
    }

    #[test]
    fn test_inferred_flag_defaults_to_false() {
        let mut json = serde_json::to_value(status("CEO", None)).expect("serialize");
        if let Some(obj) = json.as_object_mut() {
            obj.remove("timestamp_inferred");
        }
        let event: NormalizedEvent = serde_json::from_value(json).expect("deserialize");
        assert!(!event.timestamp_inferred);
        assert!(NormalizedEvent::received("t", event.payload).timestamp_inferred);
    }

    #[test]
    fn test_progress_kind_from_wire() {
        assert_eq!(ProgressKind::from_wire("tool_call"), Some(ProgressKind::ToolCall));
        assert_eq!(ProgressKind::from_wire("agent_status"), None);
    }
}

//! Polling fallback: status endpoint response → synthetic events.
//!
//! The status endpoint only reports agent names grouped by state, so the
//! events derived here carry no messages, confidence or citations.

use meridian_core::{AgentStatus, EventPayload, NormalizedEvent, RequestStatus};
use serde::{Deserialize, Serialize};

/// Body of `GET {api}/api/analysis/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollResponse {
    pub status: String,
    pub progress: PollProgress,
}

/// Agent names grouped by state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollProgress {
    pub active_agents: Vec<String>,
    pub completed_agents: Vec<String>,
    pub pending_agents: Vec<String>,
}

/// Events synthesized from one poll response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollBatch {
    pub events: Vec<NormalizedEvent>,
    /// Request status when the endpoint reports a recognised one.
    pub request_status: Option<RequestStatus>,
}

impl PollBatch {
    /// True once the endpoint reports a terminal request status.
    pub fn is_terminal(&self) -> bool {
        self.request_status.is_some_and(|s| s.is_terminal())
    }
}

/// One `status_update` per listed agent, in active/completed/pending order.
///
/// Events are stamped with the poll time, which identity ignores, so an
/// unchanged agent across repeated polls re-applies as a no-op.
pub fn events_from_poll(response: &PollResponse, timestamp: &str) -> PollBatch {
    let groups = [
        (&response.progress.active_agents, AgentStatus::Active),
        (&response.progress.completed_agents, AgentStatus::Completed),
        (&response.progress.pending_agents, AgentStatus::Idle),
    ];

    let events = groups
        .iter()
        .flat_map(|(agents, status)| {
            agents
                .iter()
                .map(|agent| agent.trim())
                .filter(|agent| !agent.is_empty())
                .map(move |agent| {
                    NormalizedEvent::received(
                        timestamp,
                        EventPayload::StatusUpdate {
                            agent_id: agent.to_string(),
                            status: *status,
                            message: None,
                            confidence: None,
                            parallel_group: None,
                        },
                    )
                })
        })
        .collect();

    PollBatch {
        events,
        request_status: RequestStatus::parse(&response.status).ok(),
    }
}

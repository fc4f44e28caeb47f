//! Meridian Test Utilities
//!
//! Centralized test infrastructure for the meridian workspace:
//! - Proptest generators for agent ids, statuses and normalized events
//! - Raw upstream frames, both well-formed and junk
//! - Fixtures for the reference analysis run

pub use meridian_core::{
    AgentId, AgentKind, AgentStatus, Citation, EdgeStatus, EdgeType, EventPayload,
    NormalizedEvent, ProgressKind, RequestStatus, SyncedAgent,
};

use serde_json::{json, Value};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for meridian event types.

    use super::*;
    use proptest::prelude::*;

    /// Agent ids drawn from a small pool so generated streams collide often.
    pub const AGENT_POOL: &[&str] = &[
        "CEO",
        "Research_Leader",
        "Analysis_Leader",
        "Strategy_Leader",
        "Research_Analyst_1",
        "Research_Analyst_2",
        "Technical_Analyst",
        "Portfolio_Manager",
        "Risk_Analyst",
        "Market_Data_Tool",
    ];

    // === Identity Generators ===

    /// Generate an agent id from the shared pool.
    pub fn arb_agent_id() -> impl Strategy<Value = AgentId> {
        prop::sample::select(AGENT_POOL).prop_map(str::to_string)
    }

    /// Generate an arbitrary identifier-shaped agent id.
    pub fn arb_free_agent_id() -> impl Strategy<Value = AgentId> {
        "[A-Za-z][A-Za-z0-9_]{0,23}"
    }

    /// Generate an RFC 3339 timestamp within one day.
    pub fn arb_timestamp() -> impl Strategy<Value = String> {
        (0u32..24, 0u32..60, 0u32..60, 0u32..1000).prop_map(|(h, m, s, ms)| {
            format!("2024-05-01T{:02}:{:02}:{:02}.{:03}Z", h, m, s, ms)
        })
    }

    // === Enum Generators ===

    /// Generate an AgentStatus variant.
    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop::sample::select(AgentStatus::ALL.to_vec())
    }

    /// Generate an EdgeStatus variant.
    pub fn arb_edge_status() -> impl Strategy<Value = EdgeStatus> {
        prop_oneof![
            Just(EdgeStatus::Pending),
            Just(EdgeStatus::Active),
            Just(EdgeStatus::Completed),
        ]
    }

    /// Generate an EdgeType variant.
    pub fn arb_edge_type() -> impl Strategy<Value = EdgeType> {
        prop_oneof![
            Just(EdgeType::Dependency),
            Just(EdgeType::DataFlow),
            Just(EdgeType::Parallel),
        ]
    }

    /// Generate a ProgressKind variant.
    pub fn arb_progress_kind() -> impl Strategy<Value = ProgressKind> {
        prop_oneof![
            Just(ProgressKind::ToolCall),
            Just(ProgressKind::DecisionMade),
            Just(ProgressKind::MemoryRecalled),
            Just(ProgressKind::PatternDetected),
            Just(ProgressKind::InsightGenerated),
        ]
    }

    /// Generate a RequestStatus variant.
    pub fn arb_request_status() -> impl Strategy<Value = RequestStatus> {
        prop_oneof![
            Just(RequestStatus::Active),
            Just(RequestStatus::Completed),
            Just(RequestStatus::Error),
        ]
    }

    // === Entity Generators ===

    /// Generate a confidence value in `0.0..=1.0`.
    pub fn arb_confidence() -> impl Strategy<Value = Option<f64>> {
        prop::option::of((0u32..=100).prop_map(|n| n as f64 / 100.0))
    }

    /// Generate a Citation.
    pub fn arb_citation() -> impl Strategy<Value = Citation> {
        (
            "[a-z]{3,10}",
            prop::option::of("[A-Za-z ]{1,20}"),
            arb_confidence(),
        )
            .prop_map(|(source, title, confidence)| Citation {
                url: Some(format!("https://{}.example.com", source)),
                source,
                title,
                snippet: None,
                confidence,
            })
    }

    /// Generate a SyncedAgent.
    pub fn arb_synced_agent() -> impl Strategy<Value = SyncedAgent> {
        (
            arb_agent_id(),
            arb_agent_status(),
            prop::option::of(arb_agent_id()),
            arb_confidence(),
            0u32..20,
        )
            .prop_map(|(id, status, parent_id, confidence, citation_count)| SyncedAgent {
                id,
                status,
                kind: None,
                parent_id,
                parallel_group: None,
                confidence,
                duration_secs: 0.0,
                citation_count,
            })
    }

    /// Generate an optional free-text message.
    pub fn arb_message() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z ]{1,24}")
    }

    /// Generate a payload of any kind except `full_sync`.
    pub fn arb_incremental_payload() -> impl Strategy<Value = EventPayload> {
        prop_oneof![
            4 => (
                arb_agent_id(),
                arb_agent_status(),
                arb_message(),
                arb_confidence(),
                prop::option::of(prop::sample::select(vec!["alpha", "beta"])),
            )
                .prop_map(|(agent_id, status, message, confidence, group)| {
                    EventPayload::StatusUpdate {
                        agent_id,
                        status,
                        message,
                        confidence,
                        parallel_group: group.map(str::to_string),
                    }
                }),
            2 => (
                arb_agent_id(),
                arb_agent_id(),
                arb_message(),
                arb_edge_status(),
                arb_edge_type(),
            )
                .prop_map(|(from, to, task, status, edge_type)| EventPayload::Delegation {
                    from,
                    to,
                    task,
                    status,
                    edge_type,
                }),
            1 => (
                prop::option::of(arb_agent_id()),
                prop::collection::vec(arb_citation(), 0..4),
            )
                .prop_map(|(agent_id, citations)| EventPayload::Citation {
                    agent_id,
                    citations,
                }),
            1 => (
                prop::option::of(arb_agent_id()),
                arb_progress_kind(),
                "[a-z ]{1,24}",
            )
                .prop_map(|(agent_id, progress, message)| EventPayload::GenericProgress {
                    agent_id,
                    progress,
                    message,
                }),
            1 => (prop::option::of(arb_agent_id()), "[a-z ]{1,24}")
                .prop_map(|(agent_id, message)| EventPayload::Error { agent_id, message }),
        ]
    }

    /// Generate a payload of any kind.
    pub fn arb_payload() -> impl Strategy<Value = EventPayload> {
        prop_oneof![
            9 => arb_incremental_payload(),
            1 => (
                prop::collection::vec(arb_synced_agent(), 0..6),
                prop::option::of(arb_request_status()),
            )
                .prop_map(|(agents, request_status)| EventPayload::FullSync {
                    agents,
                    request_status,
                }),
        ]
    }

    /// Generate a NormalizedEvent, sometimes carrying an upstream id.
    pub fn arb_normalized_event() -> impl Strategy<Value = NormalizedEvent> {
        (arb_timestamp(), arb_payload(), prop::option::of(0u64..10_000)).prop_map(
            |(timestamp, payload, id)| {
                let event = NormalizedEvent::new(timestamp, payload);
                match id {
                    Some(id) => event.with_event_id(format!("evt-{}", id)),
                    None => event,
                }
            },
        )
    }

    /// Generate an arrival-ordered event stream.
    pub fn arb_event_stream(max_len: usize) -> impl Strategy<Value = Vec<NormalizedEvent>> {
        prop::collection::vec(arb_normalized_event(), 0..max_len)
    }

    // === Raw Frame Generators ===

    /// Generate a well-formed upstream frame of a recognised type.
    pub fn arb_known_frame() -> impl Strategy<Value = Value> {
        prop_oneof![
            (arb_agent_id(), arb_agent_status(), arb_timestamp()).prop_map(
                |(agent, status, ts)| json!({
                    "type": "agent_status",
                    "agent": agent,
                    "status": status.as_str(),
                    "timestamp": ts,
                })
            ),
            (arb_agent_id(), arb_agent_id()).prop_map(|(from, to)| json!({
                "type": "delegation",
                "from": from,
                "to": to,
                "task": "investigate",
            })),
            (arb_agent_id(), 0usize..4).prop_map(|(agent, n)| json!({
                "type": "agent_citations",
                "agent": agent,
                "citations": (0..n).map(|i| json!({"source": format!("src-{}", i)})).collect::<Vec<_>>(),
            })),
            arb_progress_kind().prop_map(|kind| json!({
                "type": kind.as_str(),
                "data": {"agent": "CEO", "message": "working"},
            })),
            "[a-z ]{0,16}".prop_map(|message| json!({"type": "error", "message": message})),
            prop::collection::vec((arb_agent_id(), arb_agent_status()), 0..5).prop_map(|agents| {
                json!({
                    "type": "state_sync",
                    "agents": agents
                        .into_iter()
                        .map(|(id, status)| json!({"id": id, "status": status.as_str()}))
                        .collect::<Vec<_>>(),
                })
            }),
        ]
    }

    /// Generate an arbitrary JSON value, mostly garbage from the normalizer's view.
    pub fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z_]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    /// Generate a frame that is either well-formed or arbitrary JSON.
    pub fn arb_raw_frame() -> impl Strategy<Value = Value> {
        prop_oneof![3 => arb_known_frame(), 1 => arb_json()]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built events for common scenarios.

    use super::*;

    pub const T0: &str = "2024-05-01T10:00:00.000Z";

    pub fn status(agent: &str, status: AgentStatus) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::StatusUpdate {
                agent_id: agent.to_string(),
                status,
                message: None,
                confidence: None,
                parallel_group: None,
            },
        )
    }

    pub fn status_with_message(agent: &str, status: AgentStatus, message: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::StatusUpdate {
                agent_id: agent.to_string(),
                status,
                message: Some(message.to_string()),
                confidence: None,
                parallel_group: None,
            },
        )
    }

    pub fn delegation(from: &str, to: &str, task: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::Delegation {
                from: from.to_string(),
                to: to.to_string(),
                task: Some(task.to_string()),
                status: EdgeStatus::Active,
                edge_type: EdgeType::Dependency,
            },
        )
    }

    pub fn citations(agent: &str, sources: &[&str]) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::Citation {
                agent_id: Some(agent.to_string()),
                citations: sources
                    .iter()
                    .map(|source| Citation {
                        source: source.to_string(),
                        ..Citation::default()
                    })
                    .collect(),
            },
        )
    }

    pub fn error(agent: Option<&str>, message: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::Error {
                agent_id: agent.map(str::to_string),
                message: message.to_string(),
            },
        )
    }

    pub fn full_sync(agents: &[(&str, AgentStatus)]) -> NormalizedEvent {
        NormalizedEvent::new(
            T0,
            EventPayload::FullSync {
                agents: agents
                    .iter()
                    .map(|(id, status)| SyncedAgent {
                        id: id.to_string(),
                        status: *status,
                        kind: None,
                        parent_id: None,
                        parallel_group: None,
                        confidence: None,
                        duration_secs: 0.0,
                        citation_count: 0,
                    })
                    .collect(),
                request_status: None,
            },
        )
    }

    /// Raw frames of a short run: the orchestrator starts, delegates to the
    /// research lead, and the lead finishes.
    pub fn reference_run_frames() -> Vec<Value> {
        vec![
            json!({"type": "agent_status", "agent": "CEO", "status": "active", "timestamp": T0}),
            json!({
                "type": "delegation",
                "from": "CEO",
                "to": "Research_Leader",
                "task": "gather data",
                "timestamp": "2024-05-01T10:00:01.000Z"
            }),
            json!({
                "type": "agent_status",
                "agent": "Research_Leader",
                "status": "active",
                "message": "Analysis completed",
                "timestamp": "2024-05-01T10:00:02.000Z"
            }),
        ]
    }
}

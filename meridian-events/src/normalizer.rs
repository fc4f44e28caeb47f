//! Frame → [`NormalizedEvent`] mapping.
//!
//! Recognised upstream `type` tags:
//!
//! | upstream `type`                                   | normalized kind    |
//! |---------------------------------------------------|--------------------|
//! | `agent_status`                                    | `status_update`    |
//! | `delegation`                                      | `delegation`       |
//! | `citation_added`, `agent_citations`               | `citation`         |
//! | `tool_call`, `decision_made`, `memory_recalled`,  | `generic_progress` |
//! | `pattern_detected`, `insight_generated`           |                    |
//! | `error`                                           | `error`            |
//! | `state_sync`, `agents_update`                     | `full_sync`        |
//!
//! Fields are looked up on the frame first and then on a nested `data`
//! object. Every optional field is defaulted here so the synchronizer never
//! guesses.

use chrono::{SecondsFormat, TimeZone, Utc};
use meridian_core::{
    now_timestamp, AgentKind, AgentStatus, Citation, EdgeStatus, EdgeType, EventPayload,
    NormalizedEvent, ProgressKind, RequestStatus, SyncedAgent,
};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a frame was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Text frame that is not JSON
    Malformed(String),
    /// JSON that is not an object
    NotAnObject,
    /// Object without a string `type`
    MissingType,
    /// `type` this normalizer does not know
    UnknownType(String),
    /// Known `type` missing a field it cannot default
    MissingField {
        message_type: String,
        field: &'static str,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Malformed(err) => write!(f, "malformed frame: {}", err),
            DropReason::NotAnObject => write!(f, "frame is not a JSON object"),
            DropReason::MissingType => write!(f, "frame has no type"),
            DropReason::UnknownType(t) => write!(f, "unknown frame type '{}'", t),
            DropReason::MissingField {
                message_type,
                field,
            } => write!(f, "'{}' frame missing '{}'", message_type, field),
        }
    }
}

/// Observer for frames the normalizer drops.
pub trait DiagnosticSink: Send + Sync {
    fn dropped(&self, reason: &DropReason, raw: &Value);
}

/// Default sink: reports drops through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn dropped(&self, reason: &DropReason, raw: &Value) {
        match reason {
            // Forward-compatible producers add types; not worth a warning.
            DropReason::UnknownType(message_type) => {
                debug!(message_type = %message_type, "Dropped frame with unknown type");
            }
            _ => warn!(reason = %reason, frame = %raw, "Dropped unusable frame"),
        }
    }
}

/// Stateless normalizer with a pluggable drop observer.
#[derive(Clone)]
pub struct Normalizer {
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { diagnostics }
    }

    /// Normalize one decoded frame. Unusable frames yield `None`.
    pub fn normalize(&self, raw: &Value) -> Option<NormalizedEvent> {
        match map_frame(raw) {
            Ok(event) => Some(event),
            Err(reason) => {
                self.diagnostics.dropped(&reason, raw);
                None
            }
        }
    }

    /// Decode and normalize a text frame.
    pub fn normalize_text(&self, text: &str) -> Option<NormalizedEvent> {
        match serde_json::from_str::<Value>(text) {
            Ok(raw) => self.normalize(&raw),
            Err(err) => {
                let raw = Value::String(text.to_string());
                self.diagnostics
                    .dropped(&DropReason::Malformed(err.to_string()), &raw);
                None
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

/// Normalize with the default tracing diagnostics.
pub fn normalize(raw: &Value) -> Option<NormalizedEvent> {
    Normalizer::new().normalize(raw)
}

/// Decode and normalize with the default tracing diagnostics.
pub fn normalize_text(text: &str) -> Option<NormalizedEvent> {
    Normalizer::new().normalize_text(text)
}

// ============================================================================
// FRAME MAPPING
// ============================================================================

const AGENT_FIELDS: &[&str] = &["agent", "agent_id", "agent_name", "name"];
const MESSAGE_FIELDS: &[&str] = &["message", "status_message", "description", "content"];

fn map_frame(raw: &Value) -> Result<NormalizedEvent, DropReason> {
    let obj = raw.as_object().ok_or(DropReason::NotAnObject)?;
    let message_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DropReason::MissingType)?;
    let frame = Frame { obj };

    let payload = match message_type {
        "agent_status" => status_update(&frame, message_type)?,
        "delegation" => delegation(&frame, message_type)?,
        "citation_added" => EventPayload::Citation {
            agent_id: frame.string(AGENT_FIELDS),
            citations: frame
                .object("citation")
                .map(citation_from_object)
                .or_else(|| Some(citation_from_object(obj)))
                .into_iter()
                .collect(),
        },
        "agent_citations" => EventPayload::Citation {
            agent_id: frame.string(AGENT_FIELDS),
            citations: frame
                .array("citations")
                .map(|items| items.iter().filter_map(citation_from_value).collect())
                .unwrap_or_default(),
        },
        "tool_call" | "decision_made" | "memory_recalled" | "pattern_detected"
        | "insight_generated" => {
            let progress = ProgressKind::from_wire(message_type)
                .ok_or_else(|| DropReason::UnknownType(message_type.to_string()))?;
            EventPayload::GenericProgress {
                agent_id: frame.string(AGENT_FIELDS),
                progress,
                message: frame
                    .string(&[
                        "message",
                        "description",
                        "content",
                        "tool",
                        "tool_name",
                        "decision",
                        "insight",
                        "pattern",
                        "memory",
                    ])
                    .unwrap_or_else(|| progress.as_str().replace('_', " ")),
            }
        }
        "error" => EventPayload::Error {
            agent_id: frame.string(AGENT_FIELDS),
            message: frame
                .string(&["message", "error", "detail"])
                .unwrap_or_else(|| "unknown error".to_string()),
        },
        "state_sync" | "agents_update" => full_sync(&frame, message_type)?,
        other => return Err(DropReason::UnknownType(other.to_string())),
    };

    let mut event = match frame.timestamp() {
        Some(timestamp) => NormalizedEvent::new(timestamp, payload),
        None => NormalizedEvent::received(now_timestamp(), payload),
    };
    event.event_id = frame.string(&["event_id", "id"]).or_else(|| {
        frame
            .get("event_id")
            .or_else(|| frame.get("id"))
            .and_then(Value::as_u64)
            .map(|n| n.to_string())
    });
    Ok(event)
}

fn status_update(frame: &Frame<'_>, message_type: &str) -> Result<EventPayload, DropReason> {
    let agent_id = frame.string(AGENT_FIELDS).ok_or(DropReason::MissingField {
        message_type: message_type.to_string(),
        field: "agent",
    })?;
    let status = frame
        .string(&["status", "state"])
        .and_then(|s| AgentStatus::parse(&s).ok())
        .unwrap_or(AgentStatus::Active);
    Ok(EventPayload::StatusUpdate {
        agent_id,
        status,
        message: frame.string(MESSAGE_FIELDS),
        confidence: frame.confidence(),
        parallel_group: frame.string(&["parallel_group", "group"]),
    })
}

fn delegation(frame: &Frame<'_>, message_type: &str) -> Result<EventPayload, DropReason> {
    let from = frame
        .string(&["from", "from_agent", "delegator", "source"])
        .ok_or(DropReason::MissingField {
            message_type: message_type.to_string(),
            field: "from",
        })?;
    let to = frame
        .string(&["to", "to_agent", "delegate", "target"])
        .ok_or(DropReason::MissingField {
            message_type: message_type.to_string(),
            field: "to",
        })?;
    Ok(EventPayload::Delegation {
        from,
        to,
        task: frame.string(&["task", "task_description", "message"]),
        status: frame
            .string(&["status"])
            .and_then(|s| EdgeStatus::parse(&s).ok())
            .unwrap_or(EdgeStatus::Active),
        edge_type: frame
            .string(&["edge_type", "relationship"])
            .and_then(|s| EdgeType::parse(&s).ok())
            .unwrap_or_default(),
    })
}

fn full_sync(frame: &Frame<'_>, message_type: &str) -> Result<EventPayload, DropReason> {
    let agents = match frame.get("agents") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| synced_agent(None, item))
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(id, item)| synced_agent(Some(id), item))
            .collect(),
        _ => {
            return Err(DropReason::MissingField {
                message_type: message_type.to_string(),
                field: "agents",
            })
        }
    };
    Ok(EventPayload::FullSync {
        agents,
        request_status: frame
            .string(&["status", "request_status"])
            .and_then(|s| RequestStatus::parse(&s).ok()),
    })
}

/// One `agents` entry: an object, a bare id, or (for map form) a status string.
fn synced_agent(key: Option<&String>, item: &Value) -> Option<SyncedAgent> {
    match item {
        Value::Object(obj) => {
            let entry = Frame { obj };
            let id = entry
                .string(&["id", "name", "agent", "agent_id"])
                .or_else(|| key.cloned())?;
            Some(SyncedAgent {
                id,
                status: entry
                    .string(&["status", "state"])
                    .and_then(|s| AgentStatus::parse(&s).ok())
                    .unwrap_or_default(),
                kind: entry
                    .string(&["kind", "agent_type", "role"])
                    .and_then(|s| AgentKind::parse(&s).ok()),
                parent_id: entry.string(&["parent", "parent_id", "reports_to"]),
                parallel_group: entry.string(&["parallel_group", "group"]),
                confidence: entry.confidence(),
                duration_secs: entry
                    .number(&["duration", "duration_secs", "elapsed"])
                    .filter(|d| d.is_finite() && *d >= 0.0)
                    .unwrap_or(0.0),
                citation_count: match entry.get("citations") {
                    Some(Value::Array(items)) => items.len() as u32,
                    _ => entry
                        .number(&["citations", "citation_count"])
                        .filter(|n| n.is_finite() && *n >= 0.0)
                        .map(|n| n as u32)
                        .unwrap_or(0),
                },
            })
        }
        Value::String(s) => {
            // Map form `{ "CEO": "active" }` or list form `["CEO", ...]`.
            let (id, status) = match key {
                Some(id) => (id.clone(), AgentStatus::parse(s).unwrap_or_default()),
                None => (s.clone(), AgentStatus::Idle),
            };
            Some(SyncedAgent {
                id,
                status,
                kind: None,
                parent_id: None,
                parallel_group: None,
                confidence: None,
                duration_secs: 0.0,
                citation_count: 0,
            })
        }
        _ => None,
    }
}

fn citation_from_value(item: &Value) -> Option<Citation> {
    match item {
        Value::Object(obj) => Some(citation_from_object(obj)),
        Value::String(source) => Some(Citation {
            source: source.clone(),
            ..Citation::default()
        }),
        _ => None,
    }
}

fn citation_from_object(obj: &Map<String, Value>) -> Citation {
    let entry = Frame { obj };
    let title = entry.string(&["title"]);
    let url = entry.string(&["url", "link"]);
    let source = entry
        .string(&["source", "publisher"])
        .or_else(|| url.clone())
        .or_else(|| title.clone())
        .unwrap_or_else(|| "unknown".to_string());
    Citation {
        source,
        title,
        url,
        snippet: entry.string(&["snippet", "excerpt", "text"]),
        confidence: entry.confidence(),
    }
}

/// Field lookup over a frame and its optional nested `data` object.
struct Frame<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> Frame<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).or_else(|| {
            self.obj
                .get("data")
                .and_then(Value::as_object)
                .and_then(|data| data.get(key))
        })
    }

    fn string(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find_map(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
    }

    fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Confidence in `0..=1`; percentages are scaled down.
    fn confidence(&self) -> Option<f64> {
        let value = self.number(&["confidence", "confidence_score"])?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = if value > 1.0 { value / 100.0 } else { value };
        Some(scaled.min(1.0))
    }

    /// RFC 3339 string, epoch seconds or epoch millis.
    fn timestamp(&self) -> Option<String> {
        if let Some(ts) = self.string(&["timestamp", "time", "ts"]) {
            return Some(ts);
        }
        let epoch = self.number(&["timestamp", "time", "ts"]).and_then(|n| {
            let millis = if n > 1e11 { n } else { n * 1000.0 };
            Utc.timestamp_millis_opt(millis as i64).single()
        });
        epoch.map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::EventKind;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting {
        drops: Mutex<Vec<DropReason>>,
    }

    impl DiagnosticSink for Collecting {
        fn dropped(&self, reason: &DropReason, _raw: &Value) {
            if let Ok(mut drops) = self.drops.lock() {
                drops.push(reason.clone());
            }
        }
    }

    #[test]
    fn test_agent_status_maps_to_status_update() {
        let event = normalize(&json!({
            "type": "agent_status",
            "agent": "Research_Analyst_3",
            "status": "searching",
            "message": "Collecting filings",
            "confidence": 0.7,
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .expect("normalized");

        assert_eq!(event.kind(), EventKind::StatusUpdate);
        assert_eq!(event.timestamp, "2024-05-01T10:00:00Z");
        match event.payload {
            EventPayload::StatusUpdate {
                agent_id,
                status,
                message,
                confidence,
                ..
            } => {
                assert_eq!(agent_id, "Research_Analyst_3");
                assert_eq!(status, AgentStatus::Searching);
                assert_eq!(message.as_deref(), Some("Collecting filings"));
                assert_eq!(confidence, Some(0.7));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_missing_status_defaults_to_active() {
        let event = normalize(&json!({"type": "agent_status", "data": {"agent_id": "CEO"}}))
            .expect("normalized");
        assert!(matches!(
            event.payload,
            EventPayload::StatusUpdate { status: AgentStatus::Active, .. }
        ));
        assert!(!event.timestamp.is_empty());
        assert!(event.timestamp_inferred);
    }

    #[test]
    fn test_percentage_confidence_is_scaled() {
        let event = normalize(&json!({"type": "agent_status", "agent": "CEO", "confidence": 85}))
            .expect("normalized");
        match event.payload {
            EventPayload::StatusUpdate { confidence, .. } => assert_eq!(confidence, Some(0.85)),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_delegation_defaults() {
        let event = normalize(&json!({
            "type": "delegation",
            "from_agent": "CEO",
            "to_agent": "Research_Leader",
            "task": "gather data"
        }))
        .expect("normalized");
        assert_eq!(
            event.payload,
            EventPayload::Delegation {
                from: "CEO".into(),
                to: "Research_Leader".into(),
                task: Some("gather data".into()),
                status: EdgeStatus::Active,
                edge_type: EdgeType::Dependency,
            }
        );
    }

    #[test]
    fn test_citations_list_and_single() {
        let many = normalize(&json!({
            "type": "agent_citations",
            "agent": "Research_Analyst_1",
            "citations": [{"source": "SEC", "url": "https://sec.gov"}, "Bloomberg", 7]
        }))
        .expect("normalized");
        match many.payload {
            EventPayload::Citation { citations, .. } => {
                assert_eq!(citations.len(), 2);
                assert_eq!(citations[1].source, "Bloomberg");
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let single = normalize(&json!({
            "type": "citation_added",
            "citation": {"title": "10-K", "url": "https://example.com/10k"}
        }))
        .expect("normalized");
        match single.payload {
            EventPayload::Citation { agent_id, citations } => {
                assert_eq!(agent_id, None);
                assert_eq!(citations[0].source, "https://example.com/10k");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_progress_types_share_kind() {
        for tag in [
            "tool_call",
            "decision_made",
            "memory_recalled",
            "pattern_detected",
            "insight_generated",
        ] {
            let event = normalize(&json!({"type": tag})).expect("normalized");
            assert_eq!(event.kind(), EventKind::GenericProgress);
        }
    }

    #[test]
    fn test_state_sync_accepts_list_and_map() {
        let list = normalize(&json!({
            "type": "state_sync",
            "status": "running",
            "agents": [{"id": "CEO", "status": "active", "citations": [1, 2]}, "Risk_Analyst"]
        }))
        .expect("normalized");
        match list.payload {
            EventPayload::FullSync {
                agents,
                request_status,
            } => {
                assert_eq!(request_status, Some(RequestStatus::Active));
                assert_eq!(agents.len(), 2);
                assert_eq!(agents[0].citation_count, 2);
                assert_eq!(agents[1].status, AgentStatus::Idle);
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let map = normalize(&json!({
            "type": "agents_update",
            "agents": {"CEO": "completed", "Strategy_Leader": {"status": "thinking"}}
        }))
        .expect("normalized");
        match map.payload {
            EventPayload::FullSync { agents, .. } => {
                let ceo = agents.iter().find(|a| a.id == "CEO").expect("ceo");
                assert_eq!(ceo.status, AgentStatus::Completed);
                let lead = agents.iter().find(|a| a.id == "Strategy_Leader").expect("lead");
                assert_eq!(lead.status, AgentStatus::Thinking);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_epoch_timestamps_are_rendered() {
        let event = normalize(&json!({"type": "error", "timestamp": 1_700_000_000}))
            .expect("normalized");
        assert_eq!(event.timestamp, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_drops_are_reported_not_raised() {
        let sink = Arc::new(Collecting::default());
        let normalizer = Normalizer::with_diagnostics(sink.clone());

        assert!(normalizer.normalize(&json!({"type": "heartbeat"})).is_none());
        assert!(normalizer.normalize(&json!([1, 2])).is_none());
        assert!(normalizer.normalize(&json!({"agent": "CEO"})).is_none());
        assert!(normalizer.normalize(&json!({"type": "agent_status"})).is_none());
        assert!(normalizer.normalize_text("{not json").is_none());

        let drops = sink.drops.lock().expect("lock").clone();
        assert_eq!(drops.len(), 5);
        assert_eq!(drops[0], DropReason::UnknownType("heartbeat".into()));
        assert_eq!(drops[1], DropReason::NotAnObject);
        assert_eq!(drops[2], DropReason::MissingType);
        assert!(matches!(drops[3], DropReason::MissingField { field: "agent", .. }));
        assert!(matches!(drops[4], DropReason::Malformed(_)));
    }

    #[test]
    fn test_upstream_id_is_kept() {
        let event = normalize(&json!({"type": "error", "id": 42})).expect("normalized");
        assert_eq!(event.event_id.as_deref(), Some("42"));
    }
}

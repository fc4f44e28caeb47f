//! Stable identity for normalized events.

use meridian_core::{EdgeType, EventKind, EventPayload, NormalizedEvent};
use sha2::{Digest, Sha256};

/// Identity used to recognise a replayed event.
///
/// Upstream ids win when present; otherwise the SHA-256 of the event's
/// canonical JSON encoding (timestamp and payload). A receive-time
/// timestamp is left out, so a redelivered frame without one hashes the
/// same on every arrival.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventFingerprint(String);

impl EventFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn fingerprint(event: &NormalizedEvent) -> EventFingerprint {
    if let Some(id) = &event.event_id {
        return EventFingerprint(format!("id:{}", id));
    }
    let timestamp = (!event.timestamp_inferred).then_some(event.timestamp.as_str());
    // Struct field order is fixed, so the encoding is canonical.
    let encoded = serde_json::to_vec(&(timestamp, &event.payload)).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    EventFingerprint(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// The thing an event writes to: one agent, one edge, or the whole graph.
///
/// Replays are recognised against the last event applied under the same
/// key, so an A→B→A correction is never mistaken for a replay of the
/// first A.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReplayKey {
    Agent(EventKind, String),
    Edge {
        source_id: String,
        target_id: String,
        edge_type: EdgeType,
    },
    /// Events not tied to one agent
    Request(EventKind),
}

impl ReplayKey {
    pub fn of(event: &NormalizedEvent) -> Self {
        let kind = event.kind();
        match &event.payload {
            EventPayload::Delegation {
                from,
                to,
                edge_type,
                ..
            } => ReplayKey::Edge {
                source_id: from.clone(),
                target_id: to.clone(),
                edge_type: *edge_type,
            },
            EventPayload::FullSync { .. } => ReplayKey::Request(kind),
            _ => match event.agent_id() {
                Some(agent_id) => ReplayKey::Agent(kind, agent_id.to_string()),
                None => ReplayKey::Request(kind),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{AgentStatus, EdgeStatus};

    fn status(agent: &str, ts: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            ts,
            EventPayload::StatusUpdate {
                agent_id: agent.to_string(),
                status: AgentStatus::Active,
                message: None,
                confidence: None,
                parallel_group: None,
            },
        )
    }

    #[test]
    fn test_identical_events_share_fingerprint() {
        assert_eq!(fingerprint(&status("CEO", "t1")), fingerprint(&status("CEO", "t1")));
    }

    #[test]
    fn test_timestamp_distinguishes_events() {
        assert_ne!(fingerprint(&status("CEO", "t1")), fingerprint(&status("CEO", "t2")));
    }

    #[test]
    fn test_receive_time_is_not_part_of_identity() {
        let payload = status("CEO", "t1").payload;
        let first = NormalizedEvent::received("2024-05-01T10:00:00.001Z", payload.clone());
        let again = NormalizedEvent::received("2024-05-01T10:00:00.006Z", payload);
        assert_eq!(fingerprint(&first), fingerprint(&again));
    }

    #[test]
    fn test_upstream_id_wins() {
        let a = status("CEO", "t1").with_event_id("evt-9");
        let b = status("Research_Leader", "t2").with_event_id("evt-9");
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).as_str(), "id:evt-9");
    }

    #[test]
    fn test_replay_keys_follow_the_written_subject() {
        assert_eq!(
            ReplayKey::of(&status("CEO", "t1")),
            ReplayKey::of(&status("CEO", "t2"))
        );
        assert_ne!(
            ReplayKey::of(&status("CEO", "t1")),
            ReplayKey::of(&status("Research_Leader", "t1"))
        );

        let delegation = NormalizedEvent::new(
            "t1",
            EventPayload::Delegation {
                from: "CEO".into(),
                to: "Research_Leader".into(),
                task: None,
                status: EdgeStatus::Active,
                edge_type: EdgeType::Dependency,
            },
        );
        assert_eq!(
            ReplayKey::of(&delegation),
            ReplayKey::Edge {
                source_id: "CEO".into(),
                target_id: "Research_Leader".into(),
                edge_type: EdgeType::Dependency,
            }
        );

        let error = NormalizedEvent::new(
            "t1",
            EventPayload::Error {
                agent_id: None,
                message: "boom".into(),
            },
        );
        assert_eq!(ReplayKey::of(&error), ReplayKey::Request(EventKind::Error));
    }
}

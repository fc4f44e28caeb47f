use meridian_core::{AgentStatus, EdgeStatus, EventPayload, NormalizedEvent};
use meridian_graph::{classify, GraphState, GraphStore, IngestOutcome};
use meridian_test_utils::generators::{
    arb_agent_id, arb_agent_status, arb_edge_status, arb_edge_type, arb_event_stream,
    arb_free_agent_id, arb_normalized_event, arb_raw_frame, arb_timestamp,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn fold(events: &[NormalizedEvent]) -> GraphState {
    let mut state = GraphState::default();
    for event in events {
        state.apply(event);
    }
    state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn replaying_an_event_changes_nothing(
        prefix in arb_event_stream(20),
        event in arb_normalized_event(),
    ) {
        let mut state = fold(&prefix);
        state.apply(&event);
        let once = state.snapshot();
        state.apply(&event);
        prop_assert_eq!(state.snapshot(), once);
    }

    #[test]
    fn immediate_redelivery_matches_single_delivery(events in arb_event_stream(30)) {
        let doubled: Vec<NormalizedEvent> = events
            .iter()
            .flat_map(|event| [event.clone(), event.clone()])
            .collect();
        prop_assert_eq!(fold(&doubled).snapshot(), fold(&events).snapshot());
    }

    #[test]
    fn same_timestamp_status_flips_are_last_write_wins(
        agent in arb_agent_id(),
        first in arb_agent_status(),
        second in arb_agent_status(),
        ts in arb_timestamp(),
    ) {
        let update = |status: AgentStatus| NormalizedEvent::new(ts.clone(), EventPayload::StatusUpdate {
            agent_id: agent.clone(),
            status,
            message: None,
            confidence: None,
            parallel_group: None,
        });
        let state = fold(&[update(first), update(second), update(first)]);
        prop_assert_eq!(state.node(&agent).map(|n| n.status), Some(first));
    }

    #[test]
    fn edge_keys_are_unique(events in arb_event_stream(40)) {
        let state = fold(&events);
        let mut seen = HashSet::new();
        for edge in state.edges() {
            prop_assert!(seen.insert(edge.key()), "duplicate edge {:?}", edge.key());
        }
    }

    #[test]
    fn no_node_is_its_own_parent(events in arb_event_stream(40)) {
        let state = fold(&events);
        for node in state.nodes() {
            prop_assert_ne!(node.parent_id.as_deref(), Some(node.id.as_str()));
        }
    }

    #[test]
    fn aggregates_cover_every_node(events in arb_event_stream(40)) {
        let snapshot = fold(&events).snapshot();
        let counted: usize = snapshot.aggregates.counts.values().sum();
        prop_assert_eq!(counted, snapshot.nodes.len());
        prop_assert_eq!(snapshot.aggregates.total, snapshot.nodes.len());
    }

    #[test]
    fn duration_never_decreases(events in arb_event_stream(40)) {
        let mut state = GraphState::default();
        for event in &events {
            let before: Vec<(String, f64)> = state
                .nodes()
                .map(|n| (n.id.clone(), n.metrics.duration_secs))
                .collect();
            let full_sync = matches!(event.payload, EventPayload::FullSync { .. });
            state.apply(event);
            if full_sync {
                continue;
            }
            for (id, duration) in before {
                let after = state.node(&id).map(|n| n.metrics.duration_secs);
                prop_assert!(after.is_some_and(|d| d >= duration));
            }
        }
    }

    #[test]
    fn delegation_creates_both_endpoints(
        from in arb_agent_id(),
        to in arb_agent_id(),
        status in arb_edge_status(),
        edge_type in arb_edge_type(),
        ts in arb_timestamp(),
    ) {
        prop_assume!(from != to);
        let state = fold(&[NormalizedEvent::new(ts, EventPayload::Delegation {
            from: from.clone(),
            to: to.clone(),
            task: None,
            status,
            edge_type,
        })]);
        prop_assert_eq!(state.node(&from).map(|n| n.status), Some(AgentStatus::Idle));
        prop_assert_eq!(state.node(&to).map(|n| n.status), Some(AgentStatus::Idle));
        prop_assert_eq!(state.edge(&from, &to, edge_type).map(|e| e.status), Some(status));
    }

    #[test]
    fn later_delegation_status_wins(
        first in arb_edge_status(),
        second in arb_edge_status(),
    ) {
        let delegation = |status: EdgeStatus, ts: &str| NormalizedEvent::new(ts, EventPayload::Delegation {
            from: "CEO".into(),
            to: "Research_Leader".into(),
            task: None,
            status,
            edge_type: Default::default(),
        });
        let state = fold(&[
            delegation(first, "2024-05-01T10:00:00Z"),
            delegation(second, "2024-05-01T10:00:01Z"),
        ]);
        prop_assert_eq!(state.edges().len(), 1);
        prop_assert_eq!(state.edges()[0].status, second);
    }

    #[test]
    fn classification_is_deterministic(id in arb_free_agent_id()) {
        prop_assert_eq!(classify(&id), classify(&id));
        let classified = classify(&id);
        prop_assert_ne!(classified.parent_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn status_update_sets_status_without_completion_text(
        agent in arb_agent_id(),
        status in arb_agent_status(),
        ts in arb_timestamp(),
    ) {
        let state = fold(&[NormalizedEvent::new(ts, EventPayload::StatusUpdate {
            agent_id: agent.clone(),
            status,
            message: None,
            confidence: None,
            parallel_group: None,
        })]);
        prop_assert_eq!(state.node(&agent).map(|n| n.status), Some(status));
    }

    #[test]
    fn store_never_panics_on_raw_frames(frames in prop::collection::vec(arb_raw_frame(), 0..30)) {
        let mut store = GraphStore::default();
        let mut applied = 0u64;
        for frame in &frames {
            if store.ingest_raw(frame) == IngestOutcome::Applied {
                applied += 1;
            }
        }
        prop_assert_eq!(store.snapshot().version, applied);
    }
}

use meridian_core::EventKind;
use meridian_events::{fingerprint, normalize, EventLog, RingBuffer};
use meridian_test_utils::generators::{arb_json, arb_known_frame, arb_normalized_event, arb_raw_frame};
use proptest::prelude::*;
use serde_json::Value;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn normalize_never_panics(frame in arb_raw_frame()) {
        let _ = normalize(&frame);
    }

    #[test]
    fn known_frames_always_normalize(frame in arb_known_frame()) {
        let event = normalize(&frame);
        prop_assert!(event.is_some(), "dropped {}", frame);
    }

    #[test]
    fn frames_without_type_are_dropped(value in arb_json()) {
        let has_type = value.get("type").and_then(Value::as_str).is_some();
        prop_assume!(!has_type);
        prop_assert!(normalize(&value).is_none());
    }

    #[test]
    fn normalized_kind_matches_frame_type(frame in arb_known_frame()) {
        let tag = frame.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
        let event = normalize(&frame).expect("known frame");
        let expected = match tag.as_str() {
            "agent_status" => EventKind::StatusUpdate,
            "delegation" => EventKind::Delegation,
            "agent_citations" => EventKind::Citation,
            "error" => EventKind::Error,
            "state_sync" => EventKind::FullSync,
            _ => EventKind::GenericProgress,
        };
        prop_assert_eq!(event.kind(), expected);
    }

    #[test]
    fn normalize_is_deterministic_for_timestamped_frames(mut frame in arb_known_frame()) {
        if let Some(obj) = frame.as_object_mut() {
            obj.insert("timestamp".into(), Value::from("2024-05-01T10:00:00.000Z"));
        }
        prop_assert_eq!(normalize(&frame), normalize(&frame));
    }

    #[test]
    fn untimed_frames_keep_their_identity_on_redelivery(mut frame in arb_known_frame()) {
        if let Some(obj) = frame.as_object_mut() {
            for field in ["timestamp", "time", "ts"] {
                obj.remove(field);
            }
        }
        let first = normalize(&frame).expect("known frame");
        let again = normalize(&frame).expect("known frame");
        prop_assert!(first.timestamp_inferred);
        prop_assert_eq!(fingerprint(&first), fingerprint(&again));
    }

    #[test]
    fn fingerprint_is_stable(event in arb_normalized_event()) {
        prop_assert_eq!(fingerprint(&event), fingerprint(&event.clone()));
    }

    #[test]
    fn event_log_never_exceeds_capacity(
        events in prop::collection::vec(arb_normalized_event(), 0..120),
        capacity in 1usize..64,
    ) {
        let mut log = EventLog::new(capacity);
        for event in &events {
            log.append(event);
        }
        prop_assert_eq!(log.len(), events.len().min(capacity));
        if let Some(newest) = log.latest(1).next() {
            let last = events.last().expect("non-empty");
            prop_assert_eq!(&newest.summary, &last.summary());
        };
    }

    #[test]
    fn ring_buffer_keeps_newest(items in prop::collection::vec(any::<u16>(), 0..200), capacity in 1usize..50) {
        let mut buffer = RingBuffer::new(capacity);
        for item in &items {
            buffer.push(*item);
        }
        let kept: Vec<u16> = buffer.iter().copied().collect();
        let start = items.len().saturating_sub(capacity);
        prop_assert_eq!(kept, items[start..].to_vec());
    }
}

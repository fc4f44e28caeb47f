//! Fuzz target for the frame normalizer.
//!
//! Arbitrary bytes are fed through `normalize_text`; it must never panic,
//! and every event it returns must survive a JSON round trip.
//!
//! Run with: cargo +nightly fuzz run normalize_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use meridian_events::{normalize_text, NormalizedEvent};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Some(event) = normalize_text(input) {
            assert!(!event.timestamp.is_empty(), "normalized events carry a timestamp");

            if let Ok(encoded) = serde_json::to_string(&event) {
                let decoded: Result<NormalizedEvent, _> = serde_json::from_str(&encoded);
                assert!(decoded.is_ok(), "normalized event must decode: {}", encoded);
            }
        }
    }
});

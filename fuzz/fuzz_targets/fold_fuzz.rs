//! Fuzz target for the synchronizer.
//!
//! Input is split on newlines; each line is ingested as one frame. The
//! store must never panic and must publish exactly one version per
//! applied frame.
//!
//! Run with: cargo +nightly fuzz run fold_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use meridian_graph::{GraphStore, IngestOutcome};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut store = GraphStore::default();
    let mut applied = 0u64;
    for line in input.lines() {
        if store.ingest_text(line) == IngestOutcome::Applied {
            applied += 1;
        }
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.version, applied);
    assert_eq!(snapshot.aggregates.total, snapshot.nodes.len());
    assert!(store.event_log().len() as u64 <= applied);
});

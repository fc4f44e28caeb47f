use criterion::{criterion_group, criterion_main, Criterion};
use meridian_graph::{GraphState, GraphStore};
use meridian_test_utils::fixtures::reference_run_frames;
use meridian_test_utils::{AgentStatus, EventPayload, NormalizedEvent};
use std::hint::black_box;

const WORKERS: &[&str] = &[
    "Research_Analyst_1",
    "Research_Analyst_2",
    "Technical_Analyst",
    "Portfolio_Manager",
    "Risk_Analyst",
    "Market_Data_Tool",
];

fn synthetic_run(rounds: usize) -> Vec<NormalizedEvent> {
    let mut events = Vec::with_capacity(rounds * WORKERS.len());
    for round in 0..rounds {
        for worker in WORKERS {
            events.push(NormalizedEvent::new(
                format!("2024-05-01T10:{:02}:{:02}.000Z", round / 60, round % 60),
                EventPayload::StatusUpdate {
                    agent_id: worker.to_string(),
                    status: AgentStatus::Searching,
                    message: Some(format!("step {}", round)),
                    confidence: Some(0.5),
                    parallel_group: Some("research".to_string()),
                },
            ));
        }
    }
    events
}

fn bench_fold(c: &mut Criterion) {
    let events = synthetic_run(100);

    c.bench_function("graph/fold_600_status_updates", |b| {
        b.iter(|| {
            let mut state = GraphState::default();
            for event in &events {
                state.apply(black_box(event));
            }
            black_box(state.version());
        });
    });

    c.bench_function("graph/store_ingest_raw", |b| {
        let frames = reference_run_frames();
        b.iter(|| {
            let mut store = GraphStore::default();
            for frame in &frames {
                black_box(store.ingest_raw(black_box(frame)));
            }
            black_box(store.snapshot().version);
        });
    });
}

criterion_group!(benches, bench_fold);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wiretrack::simulate::{helix_event, TruthTrack};
use wiretrack::{ChamberTopology, HitRecord, TrackFinder};

/// A busy event: several helices across the full momentum range.
fn busy_event(topology: &ChamberTopology) -> Vec<HitRecord> {
    let truths = [
        TruthTrack {
            curvature: 0.012,
            tangential_phi: 0.8,
            impact: 0.0,
            z0: 3.0,
            tan_lambda: 0.45,
        },
        TruthTrack {
            curvature: -0.02,
            tangential_phi: 2.6,
            impact: 0.0,
            z0: -4.0,
            tan_lambda: -0.2,
        },
        TruthTrack {
            curvature: 0.005,
            tangential_phi: 1.9,
            impact: 0.0,
            z0: 1.0,
            tan_lambda: 0.1,
        },
        TruthTrack {
            curvature: -0.009,
            tangential_phi: 0.1,
            impact: 0.0,
            z0: -1.5,
            tan_lambda: 0.7,
        },
    ];
    truths
        .iter()
        .flat_map(|t| helix_event(t, topology))
        .collect()
}

fn bench_find_tracks(c: &mut Criterion) {
    let topology = ChamberTopology::cdc_like();
    let records = busy_event(&topology);
    let finder = TrackFinder::new(topology);

    c.bench_function("find_tracks_busy_event", |b| {
        b.iter(|| {
            let result = finder.find_tracks(black_box(&records));
            black_box(result.tracks.len())
        })
    });
}

fn bench_event_intake(c: &mut Criterion) {
    let topology = ChamberTopology::cdc_like();
    let records = busy_event(&topology);

    c.bench_function("event_intake", |b| {
        b.iter(|| {
            let event =
                wiretrack::EventHits::from_records(black_box(&records), black_box(&topology));
            black_box(event.len())
        })
    });
}

criterion_group!(benches, bench_find_tracks, bench_event_intake);
criterion_main!(benches);

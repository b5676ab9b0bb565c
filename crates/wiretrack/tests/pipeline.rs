//! End-to-end pipeline tests on synthetic events.

use approx::assert_relative_eq;
use wiretrack::simulate::{helix_event, layer_crossing, TruthTrack};
use wiretrack::{
    ChamberTopology, FinderConfig, HitRecord, TrackFinder, TrackPattern, WireKind,
};

fn axial_only_records(
    topo: &ChamberTopology,
    truth: &TruthTrack,
    max_hits: usize,
) -> Vec<HitRecord> {
    let circle = truth.circle();
    let mut records = Vec::new();
    for layer in 0..topo.n_layers() as u8 {
        if topo.kind_of(layer) != Some(WireKind::Axial) {
            continue;
        }
        if let Some(r) = layer_crossing(&circle, topo, layer) {
            records.push(r);
            if records.len() == max_hits {
                break;
            }
        }
    }
    records
}

#[test]
fn five_exact_hits_make_exactly_one_track() {
    let topo = ChamberTopology::cdc_like();
    let truth = TruthTrack {
        curvature: 0.01,
        tangential_phi: std::f64::consts::FRAC_PI_4,
        impact: 0.0,
        z0: 0.0,
        tan_lambda: 0.0,
    };
    let records = axial_only_records(&topo, &truth, 5);
    assert_eq!(records.len(), 5);

    let mut config = FinderConfig::default();
    config.axial.min_hits = 5;
    let finder = TrackFinder::with_config(config, topo);
    let result = finder.find_tracks(&records);

    assert_eq!(result.tracks.len(), 1);
    let track = &result.tracks[0];
    assert_eq!(track.n_hits(), 5);
    assert_relative_eq!(track.trajectory.curvature, 0.01, epsilon = 1e-4);
    assert_relative_eq!(
        track.trajectory.tangential_phi,
        std::f64::consts::FRAC_PI_4,
        epsilon = 1e-2
    );
    for pair in track.hits.windows(2) {
        assert!(
            pair[0].arc_length < pair[1].arc_length,
            "hits must be ordered by increasing arc length"
        );
    }
}

#[test]
fn two_uncorrelated_hits_make_no_track() {
    let topo = ChamberTopology::cdc_like();
    let mut config = FinderConfig::default();
    config.axial.min_hits = 3;
    let finder = TrackFinder::with_config(config, topo);
    let records = [
        HitRecord {
            layer: 4,
            wire: 31,
            drift_radius: 0.2,
        },
        HitRecord {
            layer: 27,
            wire: 95,
            drift_radius: 0.05,
        },
    ];
    let result = finder.find_tracks(&records);
    assert!(result.tracks.is_empty());
    assert_eq!(result.n_hits_used, 0);
}

#[test]
fn full_helix_is_reconstructed_in_3d() {
    let topo = ChamberTopology::cdc_like();
    let truth = TruthTrack {
        curvature: 0.012,
        tangential_phi: 0.8,
        impact: 0.0,
        z0: 3.0,
        tan_lambda: 0.45,
    };
    let records = helix_event(&truth, &topo);
    let finder = TrackFinder::new(topo);
    let result = finder.find_tracks(&records);

    assert_eq!(result.tracks.len(), 1);
    let track = &result.tracks[0];
    assert_relative_eq!(track.trajectory.curvature, truth.curvature, epsilon = 5e-4);
    assert_eq!(track.pattern, Some(TrackPattern::LongTrack));
    assert!(
        track.n_stereo_hits() >= 10,
        "stereo hits attached: {}",
        track.n_stereo_hits()
    );
    let sz = track.sz.expect("longitudinal fit");
    assert_relative_eq!(sz.tan_lambda, truth.tan_lambda, epsilon = 0.05);
    assert_relative_eq!(sz.z0, truth.z0, epsilon = 0.5);
}

#[test]
fn two_separated_tracks_are_both_found() {
    let topo = ChamberTopology::cdc_like();
    let truth_a = TruthTrack {
        curvature: 0.012,
        tangential_phi: 0.8,
        impact: 0.0,
        z0: 2.0,
        tan_lambda: 0.4,
    };
    let truth_b = TruthTrack {
        curvature: -0.02,
        tangential_phi: 2.6,
        impact: 0.0,
        z0: -4.0,
        tan_lambda: -0.2,
    };
    let mut records = helix_event(&truth_a, &topo);
    records.extend(helix_event(&truth_b, &topo));

    let finder = TrackFinder::new(topo);
    let result = finder.find_tracks(&records);
    assert_eq!(result.tracks.len(), 2);

    // Match found tracks to truths by curvature sign.
    let found_a = result
        .tracks
        .iter()
        .find(|t| t.trajectory.curvature > 0.0)
        .expect("positive-curvature track");
    let found_b = result
        .tracks
        .iter()
        .find(|t| t.trajectory.curvature < 0.0)
        .expect("negative-curvature track");
    assert_relative_eq!(found_a.trajectory.curvature, 0.012, epsilon = 1e-3);
    assert_relative_eq!(found_b.trajectory.curvature, -0.02, epsilon = 1e-3);
    // No wire claimed by both tracks.
    for h in &found_a.hits {
        assert!(!found_b.contains_wire(h.wire));
    }
}

#[test]
fn result_serializes_to_json() {
    let topo = ChamberTopology::cdc_like();
    let truth = TruthTrack {
        curvature: 0.012,
        tangential_phi: 0.8,
        impact: 0.0,
        z0: 3.0,
        tan_lambda: 0.45,
    };
    let records = helix_event(&truth, &topo);
    let finder = TrackFinder::new(topo);
    let result = finder.find_tracks(&records);

    let json = serde_json::to_string(&result).expect("serializable");
    assert!(json.contains("\"tracks\""));
    assert!(json.contains("\"trajectory\""));
}

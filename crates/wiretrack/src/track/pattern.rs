//! Superlayer-occupancy pattern classification.

use crate::topology::ChamberTopology;
use crate::track::{Track, TrackPattern};

/// Classify a track by which superlayers it populates.
///
/// `LongTrack` spans the chamber from the innermost to the outermost
/// superlayer. `Curler` starts innermost but stops short, with a fitted
/// diameter too small to ever reach the outermost superlayer. Everything
/// else is a `Tracklet`, a candidate for later merging.
pub fn classify(track: &Track, topology: &ChamberTopology) -> TrackPattern {
    let superlayers: Vec<u8> = track
        .hits
        .iter()
        .filter_map(|h| topology.superlayer_of(h.wire.layer))
        .collect();
    let Some(&min_sl) = superlayers.iter().min() else {
        return TrackPattern::Tracklet;
    };
    let max_sl = *superlayers.iter().max().expect("non-empty");
    let outermost = topology.n_superlayers().saturating_sub(1);

    if min_sl == 0 && max_sl == outermost {
        return TrackPattern::LongTrack;
    }
    if min_sl == 0 && max_sl < outermost && !can_reach(track, topology, outermost) {
        return TrackPattern::Curler;
    }
    TrackPattern::Tracklet
}

/// Whether the fitted trajectory can geometrically reach the innermost
/// radius of the given superlayer: its farthest point from the origin is
/// `|impact| + 2·radius` for a circle, unbounded for a line.
fn can_reach(track: &Track, topology: &ChamberTopology, superlayer: u8) -> bool {
    let Some(inner_radius) = topology.superlayer_inner_radius(superlayer) else {
        return false;
    };
    let curvature = track.trajectory.curvature;
    if curvature == 0.0 {
        return true;
    }
    let reach = track.trajectory.impact.abs() + 2.0 / curvature.abs();
    reach >= inner_radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::PerigeeParams;
    use crate::hit::{RlSide, WireId};
    use crate::track::RecoHit3D;

    fn track_with(curvature: f64, layers: &[u8]) -> Track {
        Track {
            trajectory: PerigeeParams {
                curvature,
                tangential_phi: 0.0,
                impact: 0.0,
            },
            chi2: 0.0,
            hits: layers
                .iter()
                .map(|&layer| RecoHit3D {
                    wire: WireId { layer, wire: 0 },
                    side: RlSide::Unknown,
                    pos: [0.0, 0.0],
                    z: None,
                    arc_length: 0.0,
                    drift_radius: 0.0,
                    hit_index: 0,
                })
                .collect(),
            sz: None,
            pattern: None,
        }
    }

    #[test]
    fn full_span_is_a_long_track() {
        let topo = ChamberTopology::cdc_like();
        // Layers 0 (superlayer 0) through 55 (superlayer 8).
        let track = track_with(0.005, &[0, 10, 25, 40, 55]);
        assert_eq!(classify(&track, &topo), TrackPattern::LongTrack);
    }

    #[test]
    fn tight_circle_stopping_short_is_a_curler() {
        let topo = ChamberTopology::cdc_like();
        // Curvature 0.06 ⇒ diameter ~33 cm: cannot reach the ~99 cm
        // outermost superlayer.
        let track = track_with(0.06, &[0, 5, 10]);
        assert_eq!(classify(&track, &topo), TrackPattern::Curler);
    }

    #[test]
    fn shallow_track_stopping_short_is_a_tracklet() {
        let topo = ChamberTopology::cdc_like();
        // Nearly straight: could have reached the outside, so the missing
        // outer hits are not explained by curling.
        let track = track_with(0.001, &[0, 5, 10]);
        assert_eq!(classify(&track, &topo), TrackPattern::Tracklet);
    }

    #[test]
    fn outer_cluster_is_a_tracklet() {
        let topo = ChamberTopology::cdc_like();
        let track = track_with(0.06, &[30, 35, 40]);
        assert_eq!(classify(&track, &topo), TrackPattern::Tracklet);
    }

    #[test]
    fn empty_track_is_a_tracklet() {
        let topo = ChamberTopology::cdc_like();
        let track = track_with(0.0, &[]);
        assert_eq!(classify(&track, &topo), TrackPattern::Tracklet);
    }
}

//! Greedy merging of overlapping track candidates.
//!
//! Pairwise comparison over the track list: two tracks sharing more than a
//! configured fraction of wires are replaced by a refit of their hit
//! union. The scan is greedy and order-dependent, so the list is first
//! brought into a canonical order — hit count descending, then curvature
//! magnitude ascending — which makes the outcome deterministic for any
//! input permutation.

use std::collections::HashSet;

use tracing::debug;

use crate::hit::{EventHits, WireId};
use crate::track::creator::TrackCreator;
use crate::track::Track;

/// Merge parameters.
#[derive(Debug, Clone, Copy)]
pub struct MergerConfig {
    /// Minimal shared-wire fraction (relative to the smaller track) that
    /// triggers a merge.
    pub min_shared_fraction: f64,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            min_shared_fraction: 0.5,
        }
    }
}

/// Fraction of shared wires relative to the smaller of the two tracks.
fn shared_fraction(a: &Track, b: &Track) -> f64 {
    if a.hits.is_empty() || b.hits.is_empty() {
        return 0.0;
    }
    let wires: HashSet<WireId> = a.hits.iter().map(|h| h.wire).collect();
    let shared = b.hits.iter().filter(|h| wires.contains(&h.wire)).count();
    shared as f64 / a.n_hits().min(b.n_hits()) as f64
}

/// Union of the two tracks' event hit indices, first track first,
/// deduplicated by wire.
fn hit_union(a: &Track, b: &Track, event: &EventHits) -> Vec<usize> {
    let mut seen: HashSet<WireId> = HashSet::new();
    let mut union = Vec::with_capacity(a.n_hits() + b.n_hits());
    for idx in a.hit_indices().chain(b.hit_indices()) {
        if seen.insert(event.hit(idx).wire) {
            union.push(idx);
        }
    }
    union
}

/// Greedily merge overlapping tracks; returns the merged list.
///
/// A pair above the threshold is replaced by the refit union (seeded by the
/// larger track's trajectory); if the refit degenerates the pair is left
/// alone. Hits of both tracks are already `taken`, so flags need no
/// update.
pub fn merge_tracks(
    mut tracks: Vec<Track>,
    event: &EventHits,
    creator: &TrackCreator,
    config: &MergerConfig,
) -> Vec<Track> {
    tracks.sort_by(|a, b| {
        b.n_hits().cmp(&a.n_hits()).then(
            a.trajectory
                .curvature
                .abs()
                .total_cmp(&b.trajectory.curvature.abs()),
        )
    });

    let mut i = 0;
    while i < tracks.len() {
        let mut j = i + 1;
        let mut merged_into_i = false;
        while j < tracks.len() {
            if shared_fraction(&tracks[i], &tracks[j]) >= config.min_shared_fraction {
                let union = hit_union(&tracks[i], &tracks[j], event);
                let seed = tracks[i].circle();
                if let Some(track) = creator.build_track(&union, event, &seed, None) {
                    debug!(
                        "merged tracks of {} and {} hits into {}",
                        tracks[i].n_hits(),
                        tracks[j].n_hits(),
                        track.n_hits()
                    );
                    tracks[i] = track;
                    tracks.remove(j);
                    merged_into_i = true;
                    continue;
                }
            }
            j += 1;
        }
        // A grown track may now overlap candidates scanned earlier.
        if !merged_into_i {
            i += 1;
        }
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeneralizedCircle;
    use crate::hit::EventHits;
    use crate::simulate;
    use crate::topology::ChamberTopology;

    /// Split a planted track's hits into two overlapping halves and build a
    /// track from each.
    fn overlapping_pair(topo: &ChamberTopology) -> (EventHits, Track, Track) {
        let truth = GeneralizedCircle::from_perigee_params(0.015, 0.4, 0.0);
        let mut records = Vec::new();
        for layer in 0..topo.n_layers() as u8 {
            if topo.kind_of(layer) == Some(crate::hit::WireKind::Axial) {
                if let Some(r) = simulate::layer_crossing(&truth, topo, layer) {
                    records.push(r);
                }
            }
        }
        let event = EventHits::from_records(&records, topo);
        let n = event.len();
        assert!(n >= 12);
        let creator = TrackCreator::default();
        // First two thirds and last two thirds: a heavy overlap.
        let first: Vec<usize> = (0..2 * n / 3).collect();
        let second: Vec<usize> = (n / 3..n).collect();
        let a = creator
            .build_track(&first, &event, &truth, None)
            .expect("track a");
        let b = creator
            .build_track(&second, &event, &truth, None)
            .expect("track b");
        (event, a, b)
    }

    #[test]
    fn overlapping_tracks_merge_into_one() {
        let topo = ChamberTopology::cdc_like();
        let (event, a, b) = overlapping_pair(&topo);
        let n_union = event.len();
        let merged = merge_tracks(
            vec![a, b],
            &event,
            &TrackCreator::default(),
            &MergerConfig::default(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].n_hits(), n_union);
    }

    #[test]
    fn disjoint_tracks_stay_apart() {
        let topo = ChamberTopology::cdc_like();
        let truth_a = GeneralizedCircle::from_perigee_params(0.015, 0.4, 0.0);
        let truth_b = GeneralizedCircle::from_perigee_params(-0.02, 2.5, 0.0);
        let mut records = Vec::new();
        let mut split = 0;
        for layer in 0..topo.n_layers() as u8 {
            if topo.kind_of(layer) == Some(crate::hit::WireKind::Axial) {
                if let Some(r) = simulate::layer_crossing(&truth_a, &topo, layer) {
                    records.push(r);
                    split += 1;
                }
            }
        }
        for layer in 0..topo.n_layers() as u8 {
            if topo.kind_of(layer) == Some(crate::hit::WireKind::Axial) {
                if let Some(r) = simulate::layer_crossing(&truth_b, &topo, layer) {
                    records.push(r);
                }
            }
        }
        let event = EventHits::from_records(&records, &topo);
        let creator = TrackCreator::default();
        let ids_a: Vec<usize> = (0..split).collect();
        let ids_b: Vec<usize> = (split..event.len()).collect();
        let a = creator.build_track(&ids_a, &event, &truth_a, None).unwrap();
        let b = creator.build_track(&ids_b, &event, &truth_b, None).unwrap();

        let merged = merge_tracks(
            vec![a, b],
            &event,
            &creator,
            &MergerConfig::default(),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn result_is_deterministic_under_permutation() {
        let topo = ChamberTopology::cdc_like();
        let (event, a, b) = overlapping_pair(&topo);
        let creator = TrackCreator::default();
        let cfg = MergerConfig::default();
        let ab = merge_tracks(vec![a.clone(), b.clone()], &event, &creator, &cfg);
        let ba = merge_tracks(vec![b, a], &event, &creator, &cfg);
        assert_eq!(ab.len(), ba.len());
        assert_eq!(ab[0].n_hits(), ba[0].n_hits());
        assert!((ab[0].trajectory.curvature - ba[0].trajectory.curvature).abs() < 1e-12);
    }
}

//! Attach stereo hits to a fitted axial track.
//!
//! Every untaken stereo hit is reconstructed in 3D against the fixed 2D
//! trajectory, once per left/right resolution: the wire's 2D path,
//! parameterized by z, is intersected with the drift-displaced circle — a
//! closed-form quadratic, no iteration. Survivors of the wire-bounds and
//! back-to-back gates seed a quad-tree search over (tan λ, z0); the single
//! best solution fixes the longitudinal track parameters, duplicate
//! left/right pairs inside it are resolved against the box's mean slope,
//! and the remaining hits are scored by the pluggable filter before being
//! attached.

use std::collections::HashMap;

use tracing::debug;

use crate::geom::GeneralizedCircle;
use crate::hit::{EventHits, RlSide, RlWireHit, WireHit};
use crate::hough::stereo::{find_single, StereoCurve, StereoSearchConfig};
use crate::stereo::filter::StereoHitFilter;
use crate::topology::ChamberTopology;
use crate::track::{RecoHit3D, SzLine, Track, TrackPattern};

/// Stereo attachment parameters.
#[derive(Debug, Clone, Copy)]
pub struct StereoMatcherConfig {
    /// The (tan λ, z0) search.
    pub search: StereoSearchConfig,
    /// Reject candidates with negative arc length (hits "behind" the track
    /// start). Disabled for curlers regardless, and can be switched off
    /// entirely to accept back-to-back/cosmic topologies.
    pub check_b2b_tracks: bool,
    /// Tolerance of the wire z-extent gate, cm.
    pub wire_bound_tolerance: f64,
}

impl Default for StereoMatcherConfig {
    fn default() -> Self {
        Self {
            search: StereoSearchConfig::default(),
            check_b2b_tracks: true,
            wire_bound_tolerance: 1.0,
        }
    }
}

/// A stereo hit reconstructed against the trajectory under one left/right
/// assumption.
#[derive(Debug, Clone, Copy)]
struct StereoCandidate {
    rl: RlWireHit,
    pos: [f64; 2],
    z: f64,
    arc_length: f64,
}

/// Stereo-hit attachment stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StereoHitMatcher {
    pub config: StereoMatcherConfig,
}

impl StereoHitMatcher {
    pub fn new(config: StereoMatcherConfig) -> Self {
        Self { config }
    }

    /// Reconstruct, search, resolve and attach. Returns the number of hits
    /// attached; zero is the normal outcome for low-multiplicity or
    /// ambiguous events, and leaves the track axial-only.
    pub fn match_track(
        &self,
        track: &mut Track,
        event: &mut EventHits,
        topology: &ChamberTopology,
        filter: &dyn StereoHitFilter,
    ) -> usize {
        let circle = track.circle();
        if circle.is_null() || track.hits.is_empty() {
            return 0;
        }
        let is_curler = track.pattern == Some(TrackPattern::Curler);

        // Phase writer note: this stage is the only writer of stereo-hit
        // `taken` flags; it reads but never writes axial flags.
        let mut candidates = Vec::new();
        for &i in event.stereo_indices() {
            if !event.flags.is_usable(i) {
                continue;
            }
            let hit = event.hit(i);
            for side in RlSide::both() {
                let Some((pos, z, arc_length)) =
                    reconstruct(hit, side, &circle, topology, self.config.wire_bound_tolerance)
                else {
                    continue;
                };
                if self.config.check_b2b_tracks && !is_curler && arc_length < 0.0 {
                    continue;
                }
                candidates.push(StereoCandidate {
                    rl: RlWireHit { hit: i, side },
                    pos,
                    z,
                    arc_length,
                });
            }
        }
        if candidates.len() < self.config.search.min_hits {
            return 0;
        }

        let curves: Vec<StereoCurve> = candidates
            .iter()
            .map(|c| StereoCurve {
                arc_length: c.arc_length,
                z: c.z,
            })
            .collect();
        let Some(leaf) = find_single(&self.config.search, &curves) else {
            return 0;
        };
        let (tan_lambda, z0) = leaf.bounds.center();

        let chosen = resolve_doubled_hits(&candidates, &leaf.items, tan_lambda, z0);

        let mut attached = 0usize;
        for &c in &chosen {
            let cand = &candidates[c];
            let reco = RecoHit3D {
                wire: event.hit(cand.rl.hit).wire,
                side: cand.rl.side,
                pos: cand.pos,
                z: Some(cand.z),
                arc_length: cand.arc_length,
                drift_radius: event.hit(cand.rl.hit).drift_radius,
                hit_index: cand.rl.hit,
            };
            // A NaN-free veto interface: `None` rejects the hit even though
            // it matched geometrically.
            if filter.score(&reco, track).is_none() {
                continue;
            }
            event.flags.set_taken(cand.rl.hit, true);
            track.hits.push(reco);
            attached += 1;
        }

        if attached > 0 {
            track.sort_hits();
            track.sz = Some(SzLine { z0, tan_lambda });
        }
        debug!(
            "stereo attachment: {} candidates, {} in best box, {} attached",
            candidates.len(),
            leaf.items.len(),
            attached
        );
        attached
    }
}

/// Resolve left/right duplicates inside the winning box: of two candidates
/// sharing a wire hit, keep the one whose implied slope at the box center
/// is closer to the box's mean tan λ. Returns candidate indices.
fn resolve_doubled_hits(
    candidates: &[StereoCandidate],
    in_box: &[usize],
    mean_tan_lambda: f64,
    z0: f64,
) -> Vec<usize> {
    let mut best: HashMap<usize, usize> = HashMap::new();
    for &c in in_box {
        let cand = &candidates[c];
        match best.get(&cand.rl.hit) {
            Some(&prev) if slope_offset(&candidates[prev], mean_tan_lambda, z0)
                <= slope_offset(cand, mean_tan_lambda, z0) => {}
            _ => {
                best.insert(cand.rl.hit, c);
            }
        }
    }
    let mut chosen: Vec<usize> = best.into_values().collect();
    chosen.sort_unstable();
    chosen
}

/// Distance of the candidate's implied slope `(z − z0)/s` from the box
/// mean slope. Degenerate at s ≈ 0 (a hit at the perigee constrains no
/// slope): such a candidate never wins a tie.
fn slope_offset(cand: &StereoCandidate, mean_tan_lambda: f64, z0: f64) -> f64 {
    if cand.arc_length.abs() < 1e-9 {
        return f64::INFINITY;
    }
    ((cand.z - z0) / cand.arc_length - mean_tan_lambda).abs()
}

/// Closed-form 3D reconstruction of one stereo hit against a trajectory.
///
/// The wire path `p(t) = b + t·(f − b)` (with `t` the fractional position
/// between the backward and forward ends) meets the circle displaced by
/// the signed drift radius where the algebraic distance satisfies
/// `E(p(t)) = d·(1 + n3·d)`, a quadratic in `t`. Of the two crossings the
/// one nearer the wire's midplane point is taken; the left/right pair, not
/// the root choice, carries the physical ambiguity. Returns the 2D
/// position, z, and arc length, or `None` when there is no crossing inside
/// the wire's z-extent.
fn reconstruct(
    hit: &WireHit,
    side: RlSide,
    circle: &GeneralizedCircle,
    topology: &ChamberTopology,
    tolerance: f64,
) -> Option<([f64; 2], f64, f64)> {
    let (b, f) = topology.wire_ends(hit.wire)?;
    let dx = f[0] - b[0];
    let dy = f[1] - b[1];
    let dz = f[2] - b[2];
    if dz == 0.0 {
        return None;
    }

    let [_, n1, n2, n3] = circle.n_parameters();
    let d = side.sign() * hit.drift_radius;
    let target = d * (1.0 + n3 * d);

    let qa = n3 * (dx * dx + dy * dy);
    let qb = n1 * dx + n2 * dy + 2.0 * n3 * (b[0] * dx + b[1] * dy);
    let qc = circle.fast_distance(&[b[0], b[1]]) - target;

    let t_mid = -b[2] / dz;
    let t = solve_quadratic_nearest(qa, qb, qc, t_mid)?;

    let z = b[2] + t * dz;
    if !topology.is_in_wire_bounds(hit.wire.layer, z, tolerance) {
        return None;
    }
    let pos = [b[0] + t * dx, b[1] + t * dy];
    Some((pos, z, circle.arc_length_to(&pos)))
}

/// Real root of `qa·t² + qb·t + qc = 0` nearest to `t_ref`.
fn solve_quadratic_nearest(qa: f64, qb: f64, qc: f64, t_ref: f64) -> Option<f64> {
    if qa.abs() < 1e-15 {
        if qb.abs() < 1e-15 {
            return None;
        }
        return Some(-qc / qb);
    }
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t1 = (-qb + sq) / (2.0 * qa);
    let t2 = (-qb - sq) / (2.0 * qa);
    if (t1 - t_ref).abs() <= (t2 - t_ref).abs() {
        Some(t1)
    } else {
        Some(t2)
    }
}

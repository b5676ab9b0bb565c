//! Synthetic event generation: hits of an ideal helix through the chamber.
//!
//! Used by the test suite, the benchmarks, and the CLI's `simulate`
//! subcommand. Hits are exact — the nearest wire to each layer crossing,
//! with the drift radius set to the true wire-to-trajectory distance — so
//! a finder running on a generated event should recover the truth
//! parameters up to binning resolution.

use serde::{Deserialize, Serialize};

use crate::geom::{GeneralizedCircle, PerigeeParams};
use crate::hit::{HitRecord, WireId};
use crate::topology::{ChamberTopology, Layer};

/// Truth parameters of one generated particle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TruthTrack {
    /// Signed curvature, 1/cm.
    pub curvature: f64,
    /// Direction of travel at the perigee, radians.
    pub tangential_phi: f64,
    /// Signed impact parameter, cm.
    pub impact: f64,
    /// z at the perigee, cm.
    pub z0: f64,
    /// Dip slope dz/ds.
    pub tan_lambda: f64,
}

impl TruthTrack {
    /// The transverse trajectory.
    pub fn circle(&self) -> GeneralizedCircle {
        GeneralizedCircle::from_perigee_params(self.curvature, self.tangential_phi, self.impact)
    }

    /// The transverse descriptor, for comparisons against fit output.
    pub fn perigee_params(&self) -> PerigeeParams {
        PerigeeParams {
            curvature: self.curvature,
            tangential_phi: self.tangential_phi,
            impact: self.impact,
        }
    }
}

/// First crossing of the trajectory with the cylinder of given radius: the
/// intersection point with the smallest positive arc length, or `None`
/// when the trajectory never reaches that radius.
pub fn crossing_point(circle: &GeneralizedCircle, radius: f64) -> Option<[f64; 2]> {
    if circle.is_null() {
        return None;
    }
    let candidates: [[f64; 2]; 2] = if let Some(center) = circle.center() {
        let d2 = center[0] * center[0] + center[1] * center[1];
        let d = d2.sqrt();
        if d < 1e-12 {
            return None;
        }
        let r = circle.absolute_radius();
        // Chord foot distance from the origin along the center direction.
        let a = (d2 + radius * radius - r * r) / (2.0 * d);
        let h2 = radius * radius - a * a;
        if h2 < 0.0 {
            return None;
        }
        let h = h2.sqrt();
        let ux = center[0] / d;
        let uy = center[1] / d;
        [
            [a * ux - h * uy, a * uy + h * ux],
            [a * ux + h * uy, a * uy - h * ux],
        ]
    } else {
        let p0 = circle.perigee();
        let i0 = circle.impact();
        let half2 = radius * radius - i0 * i0;
        if half2 < 0.0 {
            return None;
        }
        let half = half2.sqrt();
        let phi = circle.tangential_phi();
        let (tx, ty) = (phi.cos(), phi.sin());
        [
            [p0[0] + half * tx, p0[1] + half * ty],
            [p0[0] - half * tx, p0[1] - half * ty],
        ]
    };

    candidates
        .into_iter()
        .map(|p| (circle.arc_length_to(&p), p))
        .filter(|(s, _)| *s > 0.0)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, p)| p)
}

/// Wire whose nominal azimuth is closest to `phi`.
fn nearest_wire(layer: &Layer, phi: f64) -> u16 {
    let spacing = std::f64::consts::TAU / f64::from(layer.n_wires);
    let k = ((phi - layer.phi_offset) / spacing).round();
    k.rem_euclid(f64::from(layer.n_wires)) as u16
}

/// Hit of the trajectory on one axial layer: the nearest wire to the layer
/// crossing, drift radius set to the true miss distance. `None` for stereo
/// layers and layers the trajectory does not reach.
pub fn layer_crossing(
    circle: &GeneralizedCircle,
    topology: &ChamberTopology,
    layer: u8,
) -> Option<HitRecord> {
    let spec = topology.layer(layer)?;
    if !spec.is_axial() {
        return None;
    }
    let p = crossing_point(circle, spec.radius)?;
    let wire = nearest_wire(spec, p[1].atan2(p[0]));
    let id = WireId { layer, wire };
    let pos = topology.wire_position(id)?;
    Some(HitRecord {
        layer,
        wire,
        drift_radius: circle.distance(&pos).abs(),
    })
}

/// All hits of an ideal helix: one per layer it crosses, axial and stereo.
///
/// Stereo hits use the wire position at the true crossing z; among the
/// azimuthally nearest wires the one with the smallest miss distance is
/// chosen, which keeps every generated drift radius inside its cell.
pub fn helix_event(truth: &TruthTrack, topology: &ChamberTopology) -> Vec<HitRecord> {
    let circle = truth.circle();
    let mut records = Vec::new();

    for layer in 0..topology.n_layers() as u8 {
        let spec = match topology.layer(layer) {
            Some(s) => s,
            None => continue,
        };
        if spec.is_axial() {
            if let Some(r) = layer_crossing(&circle, topology, layer) {
                records.push(r);
            }
            continue;
        }

        let Some(p) = crossing_point(&circle, spec.radius) else {
            continue;
        };
        let s = circle.arc_length_to(&p);
        let z = truth.z0 + truth.tan_lambda * s;
        if !topology.is_in_wire_bounds(layer, z, 0.0) {
            continue;
        }

        // Undo the twist at this z to estimate the nominal azimuth, then
        // take the best of the neighboring wires.
        let t = (z - spec.z_backward) / (spec.z_forward - spec.z_backward);
        let phi_nominal = p[1].atan2(p[0]) - spec.twist() * (t - 0.5);
        let base = nearest_wire(spec, phi_nominal);
        let best = (-1i32..=1)
            .filter_map(|offset| {
                let wire = (i32::from(base) + offset)
                    .rem_euclid(i32::from(spec.n_wires)) as u16;
                let id = WireId { layer, wire };
                let pos = topology.wire_position_at(id, z)?;
                Some((wire, circle.distance(&pos).abs()))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b));
        if let Some((wire, drift)) = best {
            records.push(HitRecord {
                layer,
                wire,
                drift_radius: drift,
            });
        }
    }
    records
}

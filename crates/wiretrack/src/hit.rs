//! Wire-hit model and the per-event working set.
//!
//! [`WireHit`]s are immutable once built: position and conformal
//! coordinates are computed at construction and never change. All mutable
//! per-event state — the `taken`/`background`/`masked` cell flags written
//! by the search stages — lives in the [`HitFlags`] arena owned by
//! [`EventHits`], indexed by hit id. Each pipeline phase is the sole writer
//! of the flags it touches; nothing outlives the event.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::topology::ChamberTopology;

/// Identifier of a single sense wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireId {
    /// Continuous layer index, innermost = 0.
    pub layer: u8,
    /// Wire index within the layer.
    pub wire: u16,
}

/// Axial/stereo classification of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    /// Wire parallel to the chamber axis; 2D information only.
    Axial,
    /// Skewed wire; carries z information once a 2D trajectory is known.
    Stereo,
}

/// Left/right passage ambiguity of a drift measurement.
///
/// `Left` means the trajectory passed on the left of the wire as seen along
/// the direction of travel, which by the orientation convention is a
/// positive signed distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RlSide {
    Left,
    Right,
    Unknown,
}

impl RlSide {
    /// Sign multiplying the drift radius: +1 left, −1 right, 0 unknown.
    pub fn sign(self) -> f64 {
        match self {
            RlSide::Left => 1.0,
            RlSide::Right => -1.0,
            RlSide::Unknown => 0.0,
        }
    }

    /// The opposite resolution.
    pub fn opposite(self) -> Self {
        match self {
            RlSide::Left => RlSide::Right,
            RlSide::Right => RlSide::Left,
            RlSide::Unknown => RlSide::Unknown,
        }
    }

    /// Both concrete resolutions, in a fixed order.
    pub fn both() -> [RlSide; 2] {
        [RlSide::Left, RlSide::Right]
    }
}

/// A wire hit paired with an assumed left/right resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlWireHit {
    /// Index of the underlying hit in the event working set.
    pub hit: usize,
    pub side: RlSide,
}

/// Raw per-event input record, as supplied by the data-acquisition
/// collaborator (and as read from JSON by the CLI).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitRecord {
    pub layer: u8,
    pub wire: u16,
    /// Unsigned drift-distance estimate, cm.
    pub drift_radius: f64,
}

/// Conformal coordinates of an axial hit, precomputed for the Legendre
/// search: with `R̃² = x² + y² − ℓ²`,
/// `(ξ, η, δ) = (2x/R̃², 2y/R̃², 2ℓ/R̃²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConformalCoords {
    pub xi: f64,
    pub eta: f64,
    pub delta: f64,
}

/// One fired wire: immutable geometry and drift measurement.
#[derive(Debug, Clone)]
pub struct WireHit {
    pub wire: WireId,
    pub superlayer: u8,
    pub kind: WireKind,
    /// Reference 2D position at the midplane, cm.
    pub pos: [f64; 2],
    /// Unsigned drift radius, cm.
    pub drift_radius: f64,
    conformal: Option<ConformalCoords>,
}

impl WireHit {
    fn new(
        wire: WireId,
        superlayer: u8,
        kind: WireKind,
        pos: [f64; 2],
        drift_radius: f64,
    ) -> Self {
        let r2 = pos[0] * pos[0] + pos[1] * pos[1] - drift_radius * drift_radius;
        let conformal = (r2 > 0.0).then(|| ConformalCoords {
            xi: 2.0 * pos[0] / r2,
            eta: 2.0 * pos[1] / r2,
            delta: 2.0 * drift_radius / r2,
        });
        Self {
            wire,
            superlayer,
            kind,
            pos,
            drift_radius,
            conformal,
        }
    }

    /// Precomputed conformal coordinates; `None` when the hit sits inside
    /// its own drift circle as seen from the origin (degenerate, flagged as
    /// background at intake).
    pub fn conformal(&self) -> Option<ConformalCoords> {
        self.conformal
    }
}

// ── Cell flags ─────────────────────────────────────────────────────────────

/// Per-event mutable hit state, arena-indexed by hit id.
#[derive(Debug, Clone)]
pub struct HitFlags {
    taken: Vec<bool>,
    background: Vec<bool>,
    masked: Vec<bool>,
}

impl HitFlags {
    fn new(n: usize) -> Self {
        Self {
            taken: vec![false; n],
            background: vec![false; n],
            masked: vec![false; n],
        }
    }

    /// Clear every flag; call between events when reusing the arena.
    pub fn reset(&mut self) {
        self.taken.fill(false);
        self.background.fill(false);
        self.masked.fill(false);
    }

    pub fn is_taken(&self, hit: usize) -> bool {
        self.taken[hit]
    }

    pub fn set_taken(&mut self, hit: usize, taken: bool) {
        self.taken[hit] = taken;
    }

    pub fn is_background(&self, hit: usize) -> bool {
        self.background[hit]
    }

    pub fn set_background(&mut self, hit: usize, background: bool) {
        self.background[hit] = background;
    }

    pub fn is_masked(&self, hit: usize) -> bool {
        self.masked[hit]
    }

    pub fn set_masked(&mut self, hit: usize, masked: bool) {
        self.masked[hit] = masked;
    }

    /// Hit is available to the search: not taken, not background, not
    /// masked.
    pub fn is_usable(&self, hit: usize) -> bool {
        !self.taken[hit] && !self.background[hit] && !self.masked[hit]
    }

    pub fn n_taken(&self) -> usize {
        self.taken.iter().filter(|t| **t).count()
    }
}

// ── Event working set ──────────────────────────────────────────────────────

/// The per-event working set: immutable hits plus their mutable flag arena,
/// partitioned into axial and stereo index lists.
#[derive(Debug, Clone)]
pub struct EventHits {
    hits: Vec<WireHit>,
    /// Mutable cell flags. Writers: intake (background), the axial search
    /// and track creation (taken), post-processing (taken), stereo
    /// attachment (taken).
    pub flags: HitFlags,
    axial: Vec<usize>,
    stereo: Vec<usize>,
}

impl EventHits {
    /// Build the working set from raw records. Records naming unknown
    /// wires are dropped; hits with an implausible drift radius are kept
    /// but flagged `background`.
    pub fn from_records(records: &[HitRecord], topology: &ChamberTopology) -> Self {
        let mut hits = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        for r in records {
            let wire = WireId {
                layer: r.layer,
                wire: r.wire,
            };
            let (Some(pos), Some(kind), Some(superlayer)) = (
                topology.wire_position(wire),
                topology.kind_of(r.layer),
                topology.superlayer_of(r.layer),
            ) else {
                dropped += 1;
                continue;
            };
            hits.push(WireHit::new(wire, superlayer, kind, pos, r.drift_radius));
        }
        if dropped > 0 {
            debug!("dropped {} hit records naming unknown wires", dropped);
        }

        let mut flags = HitFlags::new(hits.len());
        let mut axial = Vec::new();
        let mut stereo = Vec::new();
        for (i, hit) in hits.iter().enumerate() {
            let max_drift = topology
                .layer(hit.wire.layer)
                .map(|l| 1.2 * l.cell_half_width())
                .unwrap_or(f64::INFINITY);
            let drift_ok = hit.drift_radius.is_finite()
                && hit.drift_radius >= 0.0
                && hit.drift_radius <= max_drift;
            let conformal_ok = hit.kind != WireKind::Axial || hit.conformal.is_some();
            if !drift_ok || !conformal_ok {
                flags.set_background(i, true);
                continue;
            }
            match hit.kind {
                WireKind::Axial => axial.push(i),
                WireKind::Stereo => stereo.push(i),
            }
        }

        Self {
            hits,
            flags,
            axial,
            stereo,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hit(&self, index: usize) -> &WireHit {
        &self.hits[index]
    }

    pub fn hits(&self) -> &[WireHit] {
        &self.hits
    }

    /// Indices of non-background axial hits.
    pub fn axial_indices(&self) -> &[usize] {
        &self.axial
    }

    /// Indices of non-background stereo hits.
    pub fn stereo_indices(&self) -> &[usize] {
        &self.stereo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> ChamberTopology {
        ChamberTopology::cdc_like()
    }

    #[test]
    fn partitions_axial_and_stereo() {
        let records = [
            HitRecord {
                layer: 0,
                wire: 10,
                drift_radius: 0.1,
            },
            HitRecord {
                layer: 8,
                wire: 20,
                drift_radius: 0.1,
            },
        ];
        let event = EventHits::from_records(&records, &topology());
        assert_eq!(event.len(), 2);
        assert_eq!(event.axial_indices(), &[0]);
        assert_eq!(event.stereo_indices(), &[1]);
    }

    #[test]
    fn implausible_drift_is_background() {
        let records = [
            HitRecord {
                layer: 0,
                wire: 10,
                drift_radius: 5.0, // far beyond the cell half-width
            },
            HitRecord {
                layer: 0,
                wire: 11,
                drift_radius: f64::NAN,
            },
            HitRecord {
                layer: 0,
                wire: 12,
                drift_radius: -0.1,
            },
        ];
        let event = EventHits::from_records(&records, &topology());
        assert_eq!(event.len(), 3);
        assert!(event.axial_indices().is_empty());
        for i in 0..3 {
            assert!(event.flags.is_background(i));
            assert!(!event.flags.is_usable(i));
        }
    }

    #[test]
    fn unknown_wires_are_dropped() {
        let records = [HitRecord {
            layer: 99,
            wire: 0,
            drift_radius: 0.1,
        }];
        let event = EventHits::from_records(&records, &topology());
        assert!(event.is_empty());
    }

    #[test]
    fn flags_reset_clears_everything() {
        let records = [HitRecord {
            layer: 0,
            wire: 10,
            drift_radius: 0.1,
        }];
        let mut event = EventHits::from_records(&records, &topology());
        event.flags.set_taken(0, true);
        event.flags.set_masked(0, true);
        event.flags.reset();
        assert!(event.flags.is_usable(0));
        assert_eq!(event.flags.n_taken(), 0);
    }

    #[test]
    fn conformal_coordinates_match_definition() {
        let records = [HitRecord {
            layer: 0,
            wire: 0,
            drift_radius: 0.2,
        }];
        let event = EventHits::from_records(&records, &topology());
        let hit = event.hit(0);
        let c = hit.conformal().unwrap();
        let r2 = hit.pos[0] * hit.pos[0] + hit.pos[1] * hit.pos[1]
            - hit.drift_radius * hit.drift_radius;
        assert!((c.xi - 2.0 * hit.pos[0] / r2).abs() < 1e-15);
        assert!((c.eta - 2.0 * hit.pos[1] / r2).abs() < 1e-15);
        assert!((c.delta - 2.0 * hit.drift_radius / r2).abs() < 1e-15);
    }

    #[test]
    fn rl_side_signs() {
        assert_eq!(RlSide::Left.sign(), 1.0);
        assert_eq!(RlSide::Right.sign(), -1.0);
        assert_eq!(RlSide::Left.opposite(), RlSide::Right);
        assert_eq!(RlSide::Unknown.sign(), 0.0);
    }
}

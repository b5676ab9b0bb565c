//! Axial Legendre search: quad tree over (tangential angle, curvature).
//!
//! A track candidate is a circle through the origin with tangential angle
//! θ and signed curvature ω at the perigee. An axial hit at position
//! `(x, y)` with drift radius ℓ lies on that circle (on side `s = ±1`)
//! exactly when
//!
//! ```text
//! ω(θ) = s·δ + η·cos θ − ξ·sin θ
//! ```
//!
//! with the precomputed conformal coordinates `(ξ, η, δ)` of the hit. Each
//! hit therefore traces two sinusoids (one per drift side) through the
//! (θ, ω) plane; boxes where many sinusoids cross are track candidates.
//!
//! The search runs in several passes with a decaying hit-count threshold:
//! the loudest tracks are harvested first at a high threshold, then the
//! threshold is scaled down until it reaches the configured floor, and a
//! final round starts over at a lower threshold on whatever hits remain.

use tracing::{debug, info};

use crate::hit::{EventHits, WireHit};
use crate::hough::quadtree::{HoughBox, ParamCurve, QuadTree, QuadTreeConfig};

/// The two drift-side sinusoids of one axial hit.
#[derive(Debug, Clone, Copy)]
pub struct AxialCurve {
    xi: f64,
    eta: f64,
    delta: f64,
}

impl AxialCurve {
    /// Build from a hit's precomputed conformal coordinates; `None` for
    /// hits without them (degenerate, flagged background at intake).
    pub fn from_hit(hit: &WireHit) -> Option<Self> {
        hit.conformal().map(|c| Self {
            xi: c.xi,
            eta: c.eta,
            delta: c.delta,
        })
    }

    /// Curvature at which the side-`s` sinusoid passes angle `theta`.
    fn omega(&self, theta: f64, side: f64) -> f64 {
        side * self.delta + self.eta * theta.cos() - self.xi * theta.sin()
    }

    /// Range of the side-`s` sinusoid over `[theta0, theta1]`: endpoint
    /// values plus any interior extremum.
    fn omega_range(&self, theta0: f64, theta1: f64, side: f64) -> (f64, f64) {
        let w0 = self.omega(theta0, side);
        let w1 = self.omega(theta1, side);
        let (mut lo, mut hi) = if w0 <= w1 { (w0, w1) } else { (w1, w0) };

        // Extrema of η·cosθ − ξ·sinθ sit at tanθ = −ξ/η, period π.
        let theta_e = (-self.xi).atan2(self.eta);
        for k in -2..=2 {
            let t = theta_e + f64::from(k) * std::f64::consts::PI;
            if t > theta0 && t < theta1 {
                let w = self.omega(t, side);
                lo = lo.min(w);
                hi = hi.max(w);
            }
        }
        (lo, hi)
    }
}

impl ParamCurve for AxialCurve {
    fn crosses(&self, bounds: &HoughBox) -> bool {
        for side in [1.0, -1.0] {
            let (lo, hi) = self.omega_range(bounds.x.0, bounds.x.1, side);
            if lo <= bounds.y.1 && hi >= bounds.y.0 {
                return true;
            }
        }
        false
    }
}

/// Parameters of the axial multi-pass search.
#[derive(Debug, Clone, Copy)]
pub struct AxialSearchConfig {
    /// Maximal recursion level of the quad tree.
    pub max_level: usize,
    /// Candidate acceptance floor: no candidate with fewer hits is kept.
    pub min_hits: usize,
    /// Hit-count threshold the first pass starts at.
    pub initial_hit_limit: f64,
    /// Per-step threshold decay factor.
    pub step_scale: f64,
    /// Number of lower-threshold rounds over leftover hits.
    pub final_passes: usize,
    /// Threshold the final rounds start at.
    pub final_hit_limit: f64,
    /// Curvature search range, 1/cm.
    pub curv_bounds: (f64, f64),
    /// Tangential-angle search range, radians.
    pub angle_bounds: (f64, f64),
    /// Fractional overlap margin between sibling boxes.
    pub overlap: f64,
}

impl Default for AxialSearchConfig {
    fn default() -> Self {
        Self {
            max_level: 12,
            min_hits: 10,
            initial_hit_limit: 40.0,
            step_scale: 0.75,
            final_passes: 2,
            final_hit_limit: 20.0,
            curv_bounds: (-0.15, 0.15),
            angle_bounds: (0.0, std::f64::consts::PI),
            overlap: 0.0,
        }
    }
}

/// A harvested axial candidate: the Hough box and the event hit indices
/// inside it.
#[derive(Debug, Clone)]
pub struct AxialCandidate {
    pub bounds: HoughBox,
    /// Indices into the event working set.
    pub hits: Vec<usize>,
}

/// The axial Hough search.
#[derive(Debug, Clone, Default)]
pub struct AxialHoughSearch {
    pub config: AxialSearchConfig,
}

impl AxialHoughSearch {
    pub fn new(config: AxialSearchConfig) -> Self {
        Self { config }
    }

    /// Run all passes over the event's usable axial hits. Harvested hits
    /// are marked `taken`; the candidates are returned in harvest order.
    pub fn run(&self, event: &mut EventHits) -> Vec<AxialCandidate> {
        let mut candidates = Vec::new();

        self.threshold_decay_pass(event, self.config.initial_hit_limit, &mut candidates);
        let after_main = candidates.len();
        info!(
            "axial search main round: {} candidates, {} hits taken",
            after_main,
            event.flags.n_taken()
        );

        for round in 0..self.config.final_passes {
            self.threshold_decay_pass(event, self.config.final_hit_limit, &mut candidates);
            debug!(
                "axial search final round {}: {} candidates total",
                round,
                candidates.len()
            );
        }

        candidates
    }

    /// One round: sweep the acceptance threshold downward from `start`
    /// until it reaches the floor or too few usable hits remain.
    fn threshold_decay_pass(
        &self,
        event: &mut EventHits,
        start: f64,
        candidates: &mut Vec<AxialCandidate>,
    ) {
        let cfg = &self.config;
        let domain = HoughBox::new(cfg.angle_bounds, cfg.curv_bounds);
        let tree_config = QuadTreeConfig {
            max_level: cfg.max_level,
            overlap: cfg.overlap,
        };

        let floor = cfg.min_hits as f64;
        let mut limit = start.max(floor);
        let mut steps = 0usize;
        loop {
            let (ids, curves) = usable_axial_curves(event);
            if ids.len() < cfg.min_hits {
                break;
            }

            let tree = QuadTree::new(domain, tree_config, &curves);
            let found = tree.find(limit.ceil() as usize);
            for leaf in found {
                let hits: Vec<usize> = leaf.items.iter().map(|&i| ids[i]).collect();
                for &hit in &hits {
                    event.flags.set_taken(hit, true);
                }
                candidates.push(AxialCandidate {
                    bounds: leaf.bounds,
                    hits,
                });
            }

            steps += 1;
            // The sweep always ends with one iteration exactly at the
            // floor, so `min_hits` is a true acceptance threshold. A
            // non-decaying scale would never terminate.
            if limit <= floor || cfg.step_scale >= 1.0 {
                break;
            }
            limit = (limit * cfg.step_scale).max(floor);
        }
        debug!("threshold decay finished after {} steps", steps);
    }
}

/// Usable axial hits as (event index, curve) pairs.
fn usable_axial_curves(event: &EventHits) -> (Vec<usize>, Vec<AxialCurve>) {
    let mut ids = Vec::new();
    let mut curves = Vec::new();
    for &i in event.axial_indices() {
        if !event.flags.is_usable(i) {
            continue;
        }
        if let Some(curve) = AxialCurve::from_hit(event.hit(i)) {
            ids.push(i);
            curves.push(curve);
        }
    }
    (ids, curves)
}

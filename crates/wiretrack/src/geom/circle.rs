//! Generalized circle/line in normal form, with perigee parameterization.
//!
//! A trajectory in the transverse plane is the zero set of
//!
//! ```text
//! E(p) = n0 + n1·x + n2·y + n3·(x² + y²)
//! ```
//!
//! normalized so that `n1² + n2² − 4·n0·n3 = 1`. The form degrades
//! gracefully: `n3 = 0` is an exact straight line, and the all-zero tuple is
//! the "null" circle (no geometry — produced by degenerate fits and checked
//! by callers via [`GeneralizedCircle::is_null`]).
//!
//! Orientation convention: curvature `ω = 2·n3` is positive for
//! counterclockwise traversal, and the signed distance of a point outside a
//! counterclockwise circle is positive.

use serde::{Deserialize, Serialize};

use super::vec::{cross, perp_ccw, unit_from_angle, unit_or_x, Vec2};

/// Traversal orientation of a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
}

impl Orientation {
    /// +1 for counterclockwise, −1 for clockwise.
    pub fn signum(self) -> f64 {
        match self {
            Orientation::CounterClockwise => 1.0,
            Orientation::Clockwise => -1.0,
        }
    }
}

/// Perigee parameters of a 2D trajectory: the serializable descriptor
/// exported on tracks.
///
/// `curvature` is signed (counterclockwise positive), `tangential_phi` is
/// the direction of travel at the perigee, and `impact` is the signed
/// distance of the perigee from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerigeeParams {
    /// Signed curvature, 1/cm.
    pub curvature: f64,
    /// Direction of travel at the point of closest approach, radians.
    pub tangential_phi: f64,
    /// Signed distance of closest approach to the origin, cm.
    pub impact: f64,
}

impl PerigeeParams {
    /// Build the circle this descriptor denotes.
    pub fn circle(&self) -> GeneralizedCircle {
        GeneralizedCircle::from_perigee_params(self.curvature, self.tangential_phi, self.impact)
    }
}

/// Circle or line in normal form `(n0, n1, n2, n3)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralizedCircle {
    n0: f64,
    n12: Vec2,
    n3: f64,
}

/// Threshold below which `sin`/`cos` arc helpers switch to their Taylor
/// expansions to avoid catastrophic cancellation.
const SMALL_ARC: f64 = 1e-4;

impl GeneralizedCircle {
    // ── Constructors ───────────────────────────────────────────────────────

    /// The null circle: no geometry. Degenerate fits produce this.
    pub fn null() -> Self {
        Self {
            n0: 0.0,
            n12: Vec2::zeros(),
            n3: 0.0,
        }
    }

    /// Construct from raw normal-form parameters, normalizing the tuple.
    ///
    /// Returns the null circle when the parameters cannot be normalized
    /// (`n1 = n2 = n3 = 0`, or an imaginary circle with
    /// `n1² + n2² − 4·n0·n3 ≤ 0`). Callers must check
    /// [`is_null`](Self::is_null) before geometric queries.
    pub fn from_n(n0: f64, n1: f64, n2: f64, n3: f64) -> Self {
        let norm_sq = n1 * n1 + n2 * n2 - 4.0 * n0 * n3;
        if !norm_sq.is_finite() || norm_sq <= 0.0 {
            return Self::null();
        }
        let s = 1.0 / norm_sq.sqrt();
        Self {
            n0: n0 * s,
            n12: Vec2::new(n1 * s, n2 * s),
            n3: n3 * s,
        }
    }

    /// Construct a proper circle from its center, radius and orientation.
    pub fn from_center_and_radius(center: [f64; 2], radius: f64, orientation: Orientation) -> Self {
        let c = Vec2::new(center[0], center[1]);
        let n3 = orientation.signum() / (2.0 * radius);
        Self {
            n0: n3 * (c.norm_squared() - radius * radius),
            n12: -2.0 * n3 * c,
            n3,
        }
    }

    /// Construct from perigee parameters (signed curvature, tangential
    /// direction at the perigee, signed impact parameter).
    pub fn from_perigee_params(curvature: f64, tangential_phi: f64, impact: f64) -> Self {
        let tangent = unit_from_angle(tangential_phi);
        // Outward normal at the perigee: the tangent rotated by −90°.
        let normal = Vec2::new(tangent.y, -tangent.x);
        Self {
            n0: impact * (1.0 + curvature * impact / 2.0),
            n12: (1.0 + curvature * impact) * normal,
            n3: curvature / 2.0,
        }
    }

    /// A straight line through `point` with direction angle `phi`.
    pub fn line_through(point: [f64; 2], phi: f64) -> Self {
        let p = Vec2::new(point[0], point[1]);
        let tangent = unit_from_angle(phi);
        let normal = Vec2::new(tangent.y, -tangent.x);
        Self {
            n0: -normal.dot(&p),
            n12: normal,
            n3: 0.0,
        }
    }

    // ── State queries ──────────────────────────────────────────────────────

    /// True for the degenerate all-zero tuple.
    pub fn is_null(&self) -> bool {
        self.n0 == 0.0 && self.n12 == Vec2::zeros() && self.n3 == 0.0
    }

    /// True for an exact straight line (`n3 = 0`).
    pub fn is_line(&self) -> bool {
        self.n3 == 0.0 && !self.is_null()
    }

    /// Raw normal-form parameters `(n0, n1, n2, n3)`.
    pub fn n_parameters(&self) -> [f64; 4] {
        [self.n0, self.n12.x, self.n12.y, self.n3]
    }

    // ── Derived quantities ─────────────────────────────────────────────────

    /// Signed curvature `ω = 2·n3`; zero for a line.
    pub fn curvature(&self) -> f64 {
        2.0 * self.n3
    }

    /// Signed radius `1/ω`; infinite for a line.
    pub fn radius(&self) -> f64 {
        1.0 / self.curvature()
    }

    /// Unsigned radius; infinite for a line.
    pub fn absolute_radius(&self) -> f64 {
        self.radius().abs()
    }

    /// Center of the circle; `None` for a line or null circle.
    pub fn center(&self) -> Option<[f64; 2]> {
        if self.n3 == 0.0 {
            return None;
        }
        let c = -self.n12 / (2.0 * self.n3);
        Some([c.x, c.y])
    }

    /// Signed impact parameter: distance of closest approach to the origin.
    pub fn impact(&self) -> f64 {
        self.distance(&[0.0, 0.0])
    }

    /// Direction of travel at the perigee, radians.
    pub fn tangential_phi(&self) -> f64 {
        let t = self.tangential(&[0.0, 0.0]);
        t[1].atan2(t[0])
    }

    /// The perigee descriptor of this circle.
    pub fn perigee_params(&self) -> PerigeeParams {
        PerigeeParams {
            curvature: self.curvature(),
            tangential_phi: self.tangential_phi(),
            impact: self.impact(),
        }
    }

    // ── Distance and projection ────────────────────────────────────────────

    /// Algebraic ("fast") distance `E(p)`: cheap, agrees with the true
    /// signed distance to first order near the circle.
    pub fn fast_distance(&self, point: &[f64; 2]) -> f64 {
        let p = Vec2::new(point[0], point[1]);
        self.n0 + self.n12.dot(&p) + self.n3 * p.norm_squared()
    }

    /// Exact signed perpendicular distance from `point` to the circle.
    ///
    /// Positive outside a counterclockwise circle; sign flips under
    /// [`reverse`](Self::reverse).
    pub fn distance(&self, point: &[f64; 2]) -> f64 {
        let e = self.fast_distance(point);
        // 1 + 4·n3·E = (1 + 2·n3·d)² ≥ 0 analytically; clamp the numerics.
        let root = (1.0 + 4.0 * self.n3 * e).max(0.0).sqrt();
        2.0 * e / (1.0 + root)
    }

    /// Unit direction of increasing distance at `point`.
    pub fn normal(&self, point: &[f64; 2]) -> [f64; 2] {
        let p = Vec2::new(point[0], point[1]);
        let g = unit_or_x(self.n12 + 2.0 * self.n3 * p);
        [g.x, g.y]
    }

    /// Unit tangent, at the point on the circle closest to `point`, in the
    /// direction of travel.
    pub fn tangential(&self, point: &[f64; 2]) -> [f64; 2] {
        let n = self.normal(point);
        let t = perp_ccw(Vec2::new(n[0], n[1]));
        [t.x, t.y]
    }

    /// The point on the circle closest to `point`.
    pub fn closest_to(&self, point: &[f64; 2]) -> [f64; 2] {
        let d = self.distance(point);
        let n = self.normal(point);
        [point[0] - d * n[0], point[1] - d * n[1]]
    }

    /// The point of closest approach to the origin.
    pub fn perigee(&self) -> [f64; 2] {
        self.closest_to(&[0.0, 0.0])
    }

    // ── Arc-length parameterization ────────────────────────────────────────

    /// Position reached after traveling arc length `s` from the perigee, in
    /// the direction of travel.
    ///
    /// Near-zero curvature falls back smoothly to the line formula; no
    /// division by a vanishing curvature occurs.
    pub fn at_arc_length(&self, s: f64) -> [f64; 2] {
        let p0 = self.perigee();
        let tangent = unit_from_angle(self.tangential_phi());
        let left = perp_ccw(tangent);
        let omega = self.curvature();
        let chi = omega * s;

        let (along, aside) = if chi.abs() < SMALL_ARC {
            // sin(χ)/ω = s·(1 − χ²/6 + …), (1 − cos χ)/ω = s·(χ/2 − χ³/24 + …)
            (
                s * (1.0 - chi * chi / 6.0),
                s * (chi / 2.0 - chi * chi * chi / 24.0),
            )
        } else {
            (chi.sin() / omega, (1.0 - chi.cos()) / omega)
        };

        let p = Vec2::new(p0[0], p0[1]) + along * tangent + aside * left;
        [p.x, p.y]
    }

    /// Signed arc length from the perigee to the point on the circle
    /// closest to `point`.
    ///
    /// For circles the result is the principal value in `(−π/|ω|, π/|ω|]`.
    pub fn arc_length_to(&self, point: &[f64; 2]) -> f64 {
        let q = self.closest_to(point);
        let p0 = self.perigee();
        if self.n3 == 0.0 {
            let tangent = unit_from_angle(self.tangential_phi());
            return (Vec2::new(q[0], q[1]) - Vec2::new(p0[0], p0[1])).dot(&tangent);
        }
        let c = -self.n12 / (2.0 * self.n3);
        let u0 = Vec2::new(p0[0], p0[1]) - c;
        let u = Vec2::new(q[0], q[1]) - c;
        let delta = cross(u0, u).atan2(u0.dot(&u));
        delta / self.curvature()
    }

    // ── Transformations ────────────────────────────────────────────────────

    /// Flip the traversal orientation in place. The point set is unchanged;
    /// curvature, distance, and arc-length signs all flip.
    pub fn reverse(&mut self) {
        self.n0 = -self.n0;
        self.n12 = -self.n12;
        self.n3 = -self.n3;
    }

    /// The orientation-flipped copy.
    pub fn reversed(&self) -> Self {
        let mut c = *self;
        c.reverse();
        c
    }

    /// Re-express the circle in a coordinate frame whose origin sits at
    /// `displacement` in the current frame.
    pub fn passive_move_by(&self, displacement: [f64; 2]) -> Self {
        let d = Vec2::new(displacement[0], displacement[1]);
        Self {
            n0: self.fast_distance(&displacement),
            n12: self.n12 + 2.0 * self.n3 * d,
            n3: self.n3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn sample_circle() -> GeneralizedCircle {
        GeneralizedCircle::from_perigee_params(0.02, FRAC_PI_4, 0.5)
    }

    #[test]
    fn normal_form_invariant_holds() {
        for circle in [
            sample_circle(),
            GeneralizedCircle::from_center_and_radius([3.0, -4.0], 7.0, Orientation::Clockwise),
            GeneralizedCircle::line_through([1.0, 2.0], 0.3),
        ] {
            let [n0, n1, n2, n3] = circle.n_parameters();
            assert_relative_eq!(n1 * n1 + n2 * n2 - 4.0 * n0 * n3, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn from_n_rejects_degenerate_tuples() {
        assert!(GeneralizedCircle::from_n(1.0, 0.0, 0.0, 0.0).is_null());
        // Imaginary circle: n1² + n2² − 4·n0·n3 < 0.
        assert!(GeneralizedCircle::from_n(1.0, 0.0, 0.0, 1.0).is_null());
    }

    #[test]
    fn perigee_roundtrip() {
        let circle = sample_circle();
        let p = circle.perigee_params();
        assert_relative_eq!(p.curvature, 0.02, epsilon = 1e-12);
        assert_relative_eq!(p.tangential_phi, FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(p.impact, 0.5, epsilon = 1e-12);

        let rebuilt = p.circle();
        for (a, b) in rebuilt
            .n_parameters()
            .iter()
            .zip(circle.n_parameters().iter())
        {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn distance_sign_convention() {
        // Counterclockwise unit circle centered at the origin.
        let circle =
            GeneralizedCircle::from_center_and_radius([0.0, 0.0], 1.0, Orientation::CounterClockwise);
        assert_relative_eq!(circle.distance(&[2.0, 0.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(circle.distance(&[0.5, 0.0]), -0.5, epsilon = 1e-12);
        // Clockwise flips the sign.
        assert_relative_eq!(
            circle.reversed().distance(&[2.0, 0.0]),
            -1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn reversed_twice_is_identity() {
        let circle = sample_circle();
        let back = circle.reversed().reversed();
        for (a, b) in back.n_parameters().iter().zip(circle.n_parameters().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-15);
        }
    }

    #[test]
    fn points_on_circle_have_zero_distance() {
        let circle = sample_circle();
        for k in -10..=10 {
            let s = k as f64 * 3.7;
            let p = circle.at_arc_length(s);
            assert!(
                circle.distance(&p).abs() < 1e-9,
                "distance at s = {} should vanish, got {}",
                s,
                circle.distance(&p)
            );
        }
    }

    #[test]
    fn at_arc_length_line_limit_has_no_nan() {
        let line = GeneralizedCircle::from_perigee_params(0.0, 0.3, -1.0);
        let p = line.at_arc_length(100.0);
        assert!(p[0].is_finite() && p[1].is_finite());
        assert_relative_eq!(line.distance(&p), 0.0, epsilon = 1e-12);

        // Tiny but nonzero curvature should behave like the line.
        let near_line = GeneralizedCircle::from_perigee_params(1e-12, 0.3, -1.0);
        let q = near_line.at_arc_length(100.0);
        assert_relative_eq!(p[0], q[0], epsilon = 1e-6);
        assert_relative_eq!(p[1], q[1], epsilon = 1e-6);
    }

    #[test]
    fn arc_length_roundtrip() {
        let circle = sample_circle();
        for s in [-20.0, -1.0, 0.0, 0.5, 13.0, 40.0] {
            let p = circle.at_arc_length(s);
            assert_relative_eq!(circle.arc_length_to(&p), s, epsilon = 1e-9);
        }
    }

    #[test]
    fn arc_length_sign_matches_travel_direction() {
        // Counterclockwise circle starting at the perigee moving along +y.
        let circle = GeneralizedCircle::from_perigee_params(0.1, FRAC_PI_2, 0.0);
        let ahead = circle.at_arc_length(1.0);
        assert!(circle.arc_length_to(&ahead) > 0.0);
        let behind = circle.at_arc_length(-1.0);
        assert!(circle.arc_length_to(&behind) < 0.0);
    }

    #[test]
    fn tangential_at_perigee() {
        let circle = GeneralizedCircle::from_perigee_params(0.05, PI / 3.0, 0.2);
        let t = circle.tangential(&[0.0, 0.0]);
        assert_relative_eq!(t[1].atan2(t[0]), PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn passive_move_preserves_geometry() {
        let circle = sample_circle();
        let shift = [2.5, -1.5];
        let moved = circle.passive_move_by(shift);
        // A point on the original circle, re-expressed in the moved frame,
        // still lies on the moved circle.
        let p = circle.at_arc_length(5.0);
        let p_moved = [p[0] - shift[0], p[1] - shift[1]];
        assert_relative_eq!(moved.distance(&p_moved), 0.0, epsilon = 1e-9);
        assert_relative_eq!(moved.curvature(), circle.curvature(), epsilon = 1e-15);
    }

    #[test]
    fn closest_to_lies_on_circle() {
        let circle =
            GeneralizedCircle::from_center_and_radius([5.0, 5.0], 3.0, Orientation::CounterClockwise);
        for p in [[0.0, 0.0], [5.0, 9.5], [4.0, 5.5], [-3.0, 7.0]] {
            let q = circle.closest_to(&p);
            assert_relative_eq!(circle.distance(&q), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn line_through_contains_point() {
        let line = GeneralizedCircle::line_through([1.0, 2.0], 0.7);
        assert_relative_eq!(line.distance(&[1.0, 2.0]), 0.0, epsilon = 1e-12);
        assert!(line.is_line());
        assert_eq!(line.curvature(), 0.0);
    }
}

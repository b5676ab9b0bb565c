//! Stereo search: quad tree over (tan λ, z0).
//!
//! Once a stereo hit has been reconstructed against a fixed 2D trajectory
//! it carries an arc length `s` and a z position; the hit is consistent
//! with a longitudinal track description `z(s) = z0 + tan λ · s` exactly on
//! the line `z0 = z − tan λ · s` through the (tan λ, z0) plane. Dense line
//! crossings mark the track's longitudinal parameters.
//!
//! Unlike the axial search, only a single solution per track is wanted:
//! [`find_single`] demands exactly one harvested leaf at the requested
//! threshold and reports nothing otherwise.

use tracing::debug;

use crate::hough::quadtree::{HoughBox, LeafCandidate, ParamCurve, QuadTree, QuadTreeConfig};

/// One reconstructed stereo hit as a line through the (tan λ, z0) plane.
#[derive(Debug, Clone, Copy)]
pub struct StereoCurve {
    /// Arc length of the hit along the 2D trajectory, cm.
    pub arc_length: f64,
    /// Reconstructed z, cm.
    pub z: f64,
}

impl StereoCurve {
    fn z0(&self, tan_lambda: f64) -> f64 {
        self.z - tan_lambda * self.arc_length
    }
}

impl ParamCurve for StereoCurve {
    fn crosses(&self, bounds: &HoughBox) -> bool {
        // Linear in tan λ: the range over the box is set by the endpoints.
        let a = self.z0(bounds.x.0);
        let b = self.z0(bounds.x.1);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        lo <= bounds.y.1 && hi >= bounds.y.0
    }
}

/// Parameters of the stereo quad-tree search.
#[derive(Debug, Clone, Copy)]
pub struct StereoSearchConfig {
    /// Maximal recursion level of the quad tree.
    pub max_level: usize,
    /// Minimal number of consistent hits for a longitudinal solution.
    pub min_hits: usize,
    /// tan λ search range.
    pub tan_lambda_bounds: (f64, f64),
    /// z0 search range, cm.
    pub z0_bounds: (f64, f64),
    /// Fractional overlap margin between sibling boxes.
    pub overlap: f64,
}

impl Default for StereoSearchConfig {
    fn default() -> Self {
        // tan(±75°) covers the full physical dip-angle acceptance.
        let tan75 = (75.0f64).to_radians().tan();
        Self {
            max_level: 8,
            min_hits: 5,
            tan_lambda_bounds: (-tan75, tan75),
            z0_bounds: (-20.0, 20.0),
            overlap: 0.0,
        }
    }
}

/// Run the stereo search and keep the result only when it is unique.
///
/// Zero leaves is the normal low-multiplicity outcome; more than one leaf
/// means the longitudinal assignment is ambiguous and nothing is attached
/// either way.
pub fn find_single(config: &StereoSearchConfig, curves: &[StereoCurve]) -> Option<LeafCandidate> {
    let domain = HoughBox::new(config.tan_lambda_bounds, config.z0_bounds);
    let tree = QuadTree::new(
        domain,
        QuadTreeConfig {
            max_level: config.max_level,
            overlap: config.overlap,
        },
        curves,
    );
    let mut found = tree.find(config.min_hits);
    match found.len() {
        1 => found.pop(),
        n => {
            debug!("stereo search found {} solutions, attaching none", n);
            None
        }
    }
}

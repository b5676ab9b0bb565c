//! Conformal-mapping circle fit.
//!
//! Lifting 2D observations onto the paraboloid `(x, y, x² + y²)` turns
//! circles into planes, so the best-fit circle falls out of linear algebra:
//! an eigen-decomposition of the lifted scatter matrix when only positions
//! are known, or a linear least-squares system when each observation also
//! constrains the signed distance to the trajectory (its drift radius).
//!
//! Four constraint combinations are supported: `{free, line} × {free,
//! origin}`. Line-constrained fits pin the curvature to zero;
//! origin-constrained fits force the trajectory through the origin.

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, SymmetricEigen, Vector2, Vector3};

use crate::geom::GeneralizedCircle;

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors reported by [`RiemannFitter::fit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// Fewer observations than free parameters.
    TooFewPoints {
        /// Required minimum number of observations.
        needed: usize,
        /// Provided number of observations.
        got: usize,
    },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few observations: need {}, got {}", needed, got)
            }
        }
    }
}

impl std::error::Error for FitError {}

// ── Types ──────────────────────────────────────────────────────────────────

/// One input observation: a 2D position with an optional signed drift
/// radius and a weight.
///
/// A zero drift radius means the point is assumed to lie exactly on the
/// trajectory. A nonzero drift radius constrains the *signed distance* of
/// the trajectory from the position instead (positive = left of travel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitObservation {
    /// Position in the transverse plane, cm.
    pub pos: [f64; 2],
    /// Signed drift radius, cm. Zero for position-only observations.
    pub drift_radius: f64,
    /// Relative weight.
    pub weight: f64,
}

impl FitObservation {
    /// Position-only observation with unit weight.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            pos: [x, y],
            drift_radius: 0.0,
            weight: 1.0,
        }
    }

    /// Drift-circle observation with unit weight.
    pub fn with_drift(pos: [f64; 2], drift_radius: f64) -> Self {
        Self {
            pos,
            drift_radius,
            weight: 1.0,
        }
    }
}

/// Result of a circle fit.
///
/// The fitted circle may be null when the input geometry is degenerate
/// (collinear-after-lifting, singular design matrix); the fit does not
/// report that as an error — callers check [`GeneralizedCircle::is_null`].
#[derive(Debug, Clone, Copy)]
pub struct CircleFit {
    /// The fitted trajectory.
    pub circle: GeneralizedCircle,
    /// Weighted sum of squared signed residuals.
    pub chi2: f64,
    /// Observations minus free parameters.
    pub ndf: usize,
}

/// Conformal circle fitter.
#[derive(Debug, Clone, Copy)]
pub struct RiemannFitter {
    /// Pin the curvature to zero (fit a straight line).
    pub line_constrained: bool,
    /// Force the trajectory through the origin.
    pub origin_constrained: bool,
    /// Use drift radii when present; otherwise positions only.
    pub use_drift_radius: bool,
}

impl Default for RiemannFitter {
    fn default() -> Self {
        Self {
            line_constrained: false,
            origin_constrained: false,
            use_drift_radius: true,
        }
    }
}

impl RiemannFitter {
    /// Position-only fitter (drift radii ignored).
    pub fn positions_only() -> Self {
        Self {
            use_drift_radius: false,
            ..Self::default()
        }
    }

    /// Number of free parameters of the configured fit variant.
    fn n_free_params(&self, with_drift: bool) -> usize {
        let dropped =
            usize::from(self.line_constrained) + usize::from(self.origin_constrained);
        if with_drift {
            4 - dropped
        } else {
            (3 - dropped).max(2)
        }
    }

    /// Fit a circle to the observations.
    ///
    /// Returns [`FitError::TooFewPoints`] when the system is
    /// under-determined. Degenerate geometry (all observations coincident,
    /// singular design matrix) yields a null circle with infinite chi², not
    /// an error.
    pub fn fit(&self, observations: &[FitObservation]) -> Result<CircleFit, FitError> {
        let with_drift = self.use_drift_radius
            && observations.iter().any(|o| o.drift_radius != 0.0);
        let needed = self.n_free_params(with_drift);
        if observations.len() < needed {
            return Err(FitError::TooFewPoints {
                needed,
                got: observations.len(),
            });
        }

        let circle = if with_drift {
            self.solve_drift(observations)
        } else {
            self.solve_positions(observations)
        };

        if circle.is_null() {
            return Ok(CircleFit {
                circle,
                chi2: f64::INFINITY,
                ndf: observations.len() - needed,
            });
        }

        // Chi² is computed before the orientation vote: reversal flips the
        // sign of every residual and of every drift radius alike, so the
        // value is orientation-independent.
        let chi2 = residual_chi2(&circle, observations);
        let circle = orient_outgoing(circle, observations);

        Ok(CircleFit {
            circle,
            chi2,
            ndf: observations.len() - needed,
        })
    }

    /// Eigen-decomposition path: observations lie exactly on the circle.
    fn solve_positions(&self, observations: &[FitObservation]) -> GeneralizedCircle {
        let mut sum_w = 0.0;
        let mut mean = Vector3::zeros();
        for o in observations {
            let r2 = o.pos[0] * o.pos[0] + o.pos[1] * o.pos[1];
            mean += o.weight * Vector3::new(o.pos[0], o.pos[1], r2);
            sum_w += o.weight;
        }
        if sum_w <= 0.0 {
            return GeneralizedCircle::null();
        }
        mean /= sum_w;
        if self.origin_constrained {
            // The plane must pass through the lift of the origin, which is
            // the origin of the lifted space itself.
            mean = Vector3::zeros();
        }

        if self.line_constrained {
            let mut scatter = Matrix2::zeros();
            for o in observations {
                let d = Vector2::new(o.pos[0] - mean.x, o.pos[1] - mean.y);
                scatter += o.weight * d * d.transpose();
            }
            let eigen = SymmetricEigen::new(scatter);
            let v = eigen.eigenvectors.column(smallest_index(eigen.eigenvalues.as_slice()));
            let n0 = -(v[0] * mean.x + v[1] * mean.y);
            GeneralizedCircle::from_n(n0, v[0], v[1], 0.0)
        } else {
            let mut scatter = Matrix3::zeros();
            for o in observations {
                let r2 = o.pos[0] * o.pos[0] + o.pos[1] * o.pos[1];
                let d = Vector3::new(o.pos[0], o.pos[1], r2) - mean;
                scatter += o.weight * d * d.transpose();
            }
            let eigen = SymmetricEigen::new(scatter);
            let v = eigen.eigenvectors.column(smallest_index(eigen.eigenvalues.as_slice()));
            let n0 = -v.dot(&mean);
            GeneralizedCircle::from_n(n0, v[0], v[1], v[2])
        }
    }

    /// Least-squares path: each observation constrains the signed distance
    /// of the trajectory to equal its drift radius.
    ///
    /// Rows are the algebraic distance `[1, x, y, x² + y²]` with columns
    /// dropped per the active constraints; the right-hand side is the
    /// signed drift radius. The true circle satisfies the system exactly up
    /// to the (second-order) difference between algebraic and true
    /// distance, so the solution is already close to normalized.
    fn solve_drift(&self, observations: &[FitObservation]) -> GeneralizedCircle {
        let n = observations.len();
        let m = self.n_free_params(true);
        let mut a = DMatrix::<f64>::zeros(n, m);
        let mut rhs = DVector::<f64>::zeros(n);

        for (i, o) in observations.iter().enumerate() {
            let sw = o.weight.max(0.0).sqrt();
            let mut col = 0;
            if !self.origin_constrained {
                a[(i, col)] = sw;
                col += 1;
            }
            a[(i, col)] = sw * o.pos[0];
            a[(i, col + 1)] = sw * o.pos[1];
            col += 2;
            if !self.line_constrained {
                a[(i, col)] = sw * (o.pos[0] * o.pos[0] + o.pos[1] * o.pos[1]);
            }
            rhs[i] = sw * o.drift_radius;
        }

        let svd = a.svd(true, true);
        let sol = match svd.solve(&rhs, 1e-12) {
            Ok(s) => s,
            Err(_) => return GeneralizedCircle::null(),
        };

        let mut col = 0;
        let n0 = if self.origin_constrained {
            0.0
        } else {
            col += 1;
            sol[0]
        };
        let n1 = sol[col];
        let n2 = sol[col + 1];
        let n3 = if self.line_constrained {
            0.0
        } else {
            sol[col + 2]
        };
        GeneralizedCircle::from_n(n0, n1, n2, n3)
    }
}

/// Weighted sum of squared signed residuals `d(pᵢ) − ℓᵢ`.
fn residual_chi2(circle: &GeneralizedCircle, observations: &[FitObservation]) -> f64 {
    observations
        .iter()
        .map(|o| {
            let r = circle.distance(&o.pos) - o.drift_radius;
            o.weight * r * r
        })
        .sum()
}

/// Majority-vote orientation: tracks emanate from the origin, so for most
/// observations the tangent at the observation should point away from it.
/// More than half voting inward means the fit came out backwards.
fn orient_outgoing(
    circle: GeneralizedCircle,
    observations: &[FitObservation],
) -> GeneralizedCircle {
    let mut vote = 0i64;
    for o in observations {
        let t = circle.tangential(&o.pos);
        let outward = o.pos[0] * t[0] + o.pos[1] * t[1];
        if outward > 0.0 {
            vote += 1;
        } else if outward < 0.0 {
            vote -= 1;
        }
    }
    if vote < 0 {
        circle.reversed()
    } else {
        circle
    }
}

fn smallest_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

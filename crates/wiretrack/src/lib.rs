//! wiretrack — Legendre/Hough-transform track finder for cylindrical wire
//! drift chambers.
//!
//! Reconstructs charged-particle trajectories from per-event wire-hit
//! records. The pipeline stages are:
//!
//! 1. **Intake** – build the per-event working set: hit records become
//!    immutable [`hit::WireHit`]s with precomputed conformal coordinates,
//!    partitioned into axial and stereo lists; per-hit cell flags live in a
//!    [`hit::HitFlags`] arena.
//! 2. **Axial Hough** – recursive quad-tree search in (tangential angle,
//!    curvature) space; each axial hit traces a drift-aware Legendre
//!    sinusoid, dense crossings become track candidates.
//! 3. **Fit** – closed-form conformal (Riemann) circle fit of each
//!    candidate's hit set, with drift-radius and line/origin constraint
//!    variants.
//! 4. **Track building** – candidates become 2D tracks: hits projected onto
//!    the fitted circle, ordered by arc length, orientation pinned to the
//!    Hough box.
//! 5. **Post-processing** – residual-based hit pruning, pickup of leftover
//!    hits, greedy merging of overlapping candidates, superlayer pattern
//!    classification.
//! 6. **Stereo** – per-track z-reconstruction of skew-wire hits via a second
//!    quad-tree search in (tan λ, z0) space, with left/right ambiguity
//!    resolution.
//!
//! # Public API
//!
//! [`TrackFinder`] together with [`FinderConfig`] and [`ChamberTopology`] is
//! the primary entry point; [`TrackingResult`] and [`Track`] are the output
//! records. The geometry, fitting, and search modules are public as well —
//! they are reusable primitives, not implementation details.

pub mod fit;
pub mod geom;
pub mod hit;
pub mod hough;
pub mod simulate;
pub mod stereo;
pub mod topology;
pub mod track;

mod finder;

pub use finder::{FinderConfig, TrackFinder, TrackingResult};
pub use fit::{CircleFit, FitError, FitObservation, RiemannFitter};
pub use geom::{GeneralizedCircle, Orientation, PerigeeParams};
pub use hit::{EventHits, HitRecord, RlSide, WireHit, WireId, WireKind};
pub use hough::axial::AxialSearchConfig;
pub use hough::stereo::StereoSearchConfig;
pub use stereo::{DriftResidualFilter, StereoHitFilter, StereoMatcherConfig, UnitWeightFilter};
pub use topology::ChamberTopology;
pub use track::{MergerConfig, PostProcessConfig, RecoHit3D, SzLine, Track, TrackPattern};

//! Stereo-hit attachment: z-reconstruction of skew-wire hits against a
//! fitted 2D trajectory, ambiguity resolution, and the pluggable scoring
//! filter.

mod filter;
mod matcher;

pub use filter::{DriftResidualFilter, StereoHitFilter, UnitWeightFilter};
pub use matcher::{StereoHitMatcher, StereoMatcherConfig};

//! Quad-tree Hough search: generic recursive bisection of a 2-parameter
//! space, plus the two concrete instantiations — the axial Legendre search
//! in (tangential angle, curvature) and the stereo search in (tan λ, z0).

pub mod axial;
pub mod quadtree;
pub mod stereo;

pub use quadtree::{HoughBox, LeafCandidate, ParamCurve, QuadTree, QuadTreeConfig};

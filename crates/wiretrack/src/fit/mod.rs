//! Closed-form conformal (Riemann) circle fitting.

mod riemann;

pub use riemann::{CircleFit, FitError, FitObservation, RiemannFitter};

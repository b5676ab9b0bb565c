//! Turn harvested Hough candidates into fitted 2D tracks.

use tracing::debug;

use crate::fit::{FitObservation, RiemannFitter};
use crate::geom::GeneralizedCircle;
use crate::hit::{EventHits, RlSide};
use crate::hough::axial::AxialCandidate;
use crate::track::{RecoHit3D, Track};

/// Builds [`Track`]s from hit sets: drift-aware Riemann fit, orientation
/// pinning, projection of every hit onto the fitted circle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackCreator {
    pub fitter: RiemannFitter,
}

impl TrackCreator {
    pub fn new(fitter: RiemannFitter) -> Self {
        Self { fitter }
    }

    /// Build a track from an axial Hough candidate.
    ///
    /// The candidate's hits were marked `taken` by the search; a failed fit
    /// releases them again and drops the candidate (processing of other
    /// candidates continues).
    pub fn create(&self, candidate: &AxialCandidate, event: &mut EventHits) -> Option<Track> {
        let (theta, omega) = candidate.bounds.center();
        let seed = GeneralizedCircle::from_perigee_params(omega, theta, 0.0);
        // The curvature sign comes from the Hough box, not from the fit:
        // the box bounds were what selected these hits, and the fit can
        // flip sign spuriously on near-straight candidates. Only a box
        // entirely on one side of zero curvature pins the sign.
        let pin_sign = (candidate.bounds.y.0 * candidate.bounds.y.1 > 0.0).then_some(omega);

        match self.build_track(&candidate.hits, event, &seed, pin_sign) {
            Some(track) => Some(track),
            None => {
                for &i in &candidate.hits {
                    event.flags.set_taken(i, false);
                }
                debug!(
                    "candidate with {} hits dropped: degenerate fit",
                    candidate.hits.len()
                );
                None
            }
        }
    }

    /// Fit a hit set against a seed trajectory and assemble the track.
    ///
    /// The seed provides the drift-sign estimate for each hit; `pin_sign`,
    /// when given, forces the final orientation onto that curvature sign.
    /// Flags are not touched here.
    pub fn build_track(
        &self,
        hit_ids: &[usize],
        event: &EventHits,
        seed: &GeneralizedCircle,
        pin_sign: Option<f64>,
    ) -> Option<Track> {
        let observations: Vec<FitObservation> = hit_ids
            .iter()
            .map(|&i| {
                let hit = event.hit(i);
                let side = seed.distance(&hit.pos).signum();
                FitObservation::with_drift(hit.pos, side * hit.drift_radius)
            })
            .collect();

        let fit = match self.fitter.fit(&observations) {
            Ok(fit) => fit,
            Err(err) => {
                debug!("fit failed: {}", err);
                return None;
            }
        };
        let mut circle = fit.circle;
        if circle.is_null() {
            return None;
        }
        if let Some(sign) = pin_sign {
            if sign * circle.curvature() < 0.0 {
                circle.reverse();
            }
        }

        let mut hits: Vec<RecoHit3D> = hit_ids
            .iter()
            .map(|&i| {
                let hit = event.hit(i);
                RecoHit3D {
                    wire: hit.wire,
                    side: RlSide::Unknown,
                    pos: circle.closest_to(&hit.pos),
                    z: None,
                    arc_length: circle.arc_length_to(&hit.pos),
                    drift_radius: hit.drift_radius,
                    hit_index: i,
                }
            })
            .collect();

        // Normalize the traversal so the track emanates from the origin:
        // the angle domain of the Hough search covers only half a turn, so
        // a track found in the mirrored representation comes out of the
        // pin with its arc lengths mostly negative. Majority vote over the
        // hits decides, as the reconstructed positions are unaffected by a
        // reversal.
        let negative = hits.iter().filter(|h| h.arc_length < 0.0).count();
        if 2 * negative > hits.len() {
            circle.reverse();
            for h in &mut hits {
                h.arc_length = -h.arc_length;
            }
        }
        hits.sort_by(|a, b| a.arc_length.total_cmp(&b.arc_length));

        Some(Track {
            trajectory: circle.perigee_params(),
            chi2: fit.chi2,
            hits,
            sz: None,
            pattern: None,
        })
    }
}

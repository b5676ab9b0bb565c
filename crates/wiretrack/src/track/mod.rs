//! Track model and the candidate-to-track pipeline stages.

pub mod creator;
pub mod merger;
pub mod pattern;
pub mod postprocess;

pub use creator::TrackCreator;
pub use merger::MergerConfig;
pub use postprocess::PostProcessConfig;

use serde::{Deserialize, Serialize};

use crate::geom::{GeneralizedCircle, PerigeeParams};
use crate::hit::{RlSide, WireId};

/// Superlayer-occupancy classification of a track candidate.
///
/// Informative only: the classification steers merge and stereo strategies
/// downstream but never rejects a candidate by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackPattern {
    /// Hits span from the innermost to the outermost superlayer.
    LongTrack,
    /// Starts innermost but cannot reach the outer superlayers: a
    /// low-momentum trajectory curling back.
    Curler,
    /// An isolated cluster matching neither pattern.
    Tracklet,
}

/// Longitudinal track description: `z(s) = z0 + tan λ · s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SzLine {
    /// z at the perigee, cm.
    pub z0: f64,
    /// Dip slope dz/ds.
    pub tan_lambda: f64,
}

/// One hit incorporated into a track, reconstructed on the trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoHit3D {
    pub wire: WireId,
    /// Resolved drift side; `Unknown` for axial hits, whose side the 2D
    /// search never fixes.
    pub side: RlSide,
    /// Transverse position projected onto the trajectory, cm.
    pub pos: [f64; 2],
    /// Reconstructed z; present for stereo hits only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Arc length along the trajectory from the perigee, cm.
    pub arc_length: f64,
    /// Unsigned drift radius of the underlying measurement, cm.
    pub drift_radius: f64,
    /// Index into the event working set; meaningless after the event ends.
    #[serde(skip)]
    pub(crate) hit_index: usize,
}

/// A reconstructed track: ordered hits plus the fitted trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Fitted 2D trajectory descriptor.
    pub trajectory: PerigeeParams,
    /// Weighted sum of squared fit residuals.
    pub chi2: f64,
    /// Hits ordered by increasing arc length.
    pub hits: Vec<RecoHit3D>,
    /// Longitudinal description, once stereo hits are attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sz: Option<SzLine>,
    /// Superlayer-occupancy classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<TrackPattern>,
}

impl Track {
    /// The trajectory as a geometric circle.
    pub fn circle(&self) -> GeneralizedCircle {
        self.trajectory.circle()
    }

    pub fn n_hits(&self) -> usize {
        self.hits.len()
    }

    /// Number of attached stereo hits (those with a reconstructed z).
    pub fn n_stereo_hits(&self) -> usize {
        self.hits.iter().filter(|h| h.z.is_some()).count()
    }

    pub fn contains_wire(&self, wire: WireId) -> bool {
        self.hits.iter().any(|h| h.wire == wire)
    }

    /// Restore the arc-length ordering after hits were added.
    pub(crate) fn sort_hits(&mut self) {
        self.hits
            .sort_by(|a, b| a.arc_length.total_cmp(&b.arc_length));
    }

    /// Event indices of the constituent hits.
    pub(crate) fn hit_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.hits.iter().map(|h| h.hit_index)
    }
}

//! High-level track-finding API.
//!
//! [`TrackFinder`] is the primary entry point: it owns a [`FinderConfig`]
//! and the chamber geometry, and runs the full per-event pipeline —
//! intake, axial Hough search, track building, post-processing, merging,
//! pattern classification, stereo attachment. Create once, find on many
//! events; no state crosses event boundaries.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fit::RiemannFitter;
use crate::hit::{EventHits, HitRecord};
use crate::hough::axial::{AxialHoughSearch, AxialSearchConfig};
use crate::stereo::{StereoHitFilter, StereoHitMatcher, StereoMatcherConfig, UnitWeightFilter};
use crate::topology::ChamberTopology;
use crate::track::creator::TrackCreator;
use crate::track::merger::{merge_tracks, MergerConfig};
use crate::track::pattern;
use crate::track::postprocess::{append_unused_hits, prune_bad_hits, PostProcessConfig};
use crate::track::Track;

/// Complete finder configuration, one nested block per pipeline stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinderConfig {
    /// Axial Hough search.
    pub axial: AxialSearchConfig,
    /// Stereo attachment.
    pub stereo: StereoMatcherConfig,
    /// Candidate merging.
    pub merger: MergerConfig,
    /// Residual-based clean-up between creation and merging.
    pub post: PostProcessConfig,
    /// Circle fit variant used throughout.
    pub fitter: RiemannFitter,
}

/// Serializable per-event output: the tracks plus intake counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResult {
    /// Found tracks, largest first.
    pub tracks: Vec<Track>,
    /// Hit records accepted into the working set.
    pub n_hits: usize,
    /// Usable axial hits after intake.
    pub n_axial_hits: usize,
    /// Usable stereo hits after intake.
    pub n_stereo_hits: usize,
    /// Hits incorporated into tracks.
    pub n_hits_used: usize,
}

/// The track finder. Holds configuration and geometry; stateless across
/// events.
pub struct TrackFinder {
    config: FinderConfig,
    topology: ChamberTopology,
    stereo_filter: Box<dyn StereoHitFilter + Send + Sync>,
}

impl TrackFinder {
    /// Finder with default configuration.
    pub fn new(topology: ChamberTopology) -> Self {
        Self::with_config(FinderConfig::default(), topology)
    }

    /// Finder with full configuration control.
    pub fn with_config(config: FinderConfig, topology: ChamberTopology) -> Self {
        Self {
            config,
            topology,
            stereo_filter: Box::new(UnitWeightFilter),
        }
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Mutable access for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut FinderConfig {
        &mut self.config
    }

    pub fn topology(&self) -> &ChamberTopology {
        &self.topology
    }

    /// Replace the stereo scoring filter.
    pub fn set_stereo_filter(&mut self, filter: Box<dyn StereoHitFilter + Send + Sync>) {
        self.stereo_filter = filter;
    }

    /// Run the full pipeline on one event's hit records.
    ///
    /// An event where nothing is found is a valid outcome: the result just
    /// carries an empty track list.
    pub fn find_tracks(&self, records: &[HitRecord]) -> TrackingResult {
        let mut event = EventHits::from_records(records, &self.topology);
        info!(
            "event intake: {} records, {} axial / {} stereo usable",
            records.len(),
            event.axial_indices().len(),
            event.stereo_indices().len()
        );

        let candidates = AxialHoughSearch::new(self.config.axial).run(&mut event);
        let creator = TrackCreator::new(self.config.fitter);
        let mut tracks: Vec<Track> = candidates
            .iter()
            .filter_map(|c| creator.create(c, &mut event))
            .collect();

        if self.config.post.prune_hits {
            tracks.retain_mut(|t| prune_bad_hits(t, &mut event, &creator, &self.config.post));
        }
        if self.config.post.append_unused {
            append_unused_hits(&mut tracks, &mut event, &creator, &self.config.post);
        }

        let mut tracks = merge_tracks(tracks, &event, &creator, &self.config.merger);

        for track in &mut tracks {
            track.pattern = Some(pattern::classify(track, &self.topology));
        }

        let matcher = StereoHitMatcher::new(self.config.stereo);
        for track in &mut tracks {
            matcher.match_track(track, &mut event, &self.topology, self.stereo_filter.as_ref());
        }

        tracks.sort_by(|a, b| {
            b.n_hits().cmp(&a.n_hits()).then(
                a.trajectory
                    .curvature
                    .abs()
                    .total_cmp(&b.trajectory.curvature.abs()),
            )
        });

        let result = TrackingResult {
            n_hits: event.len(),
            n_axial_hits: event.axial_indices().len(),
            n_stereo_hits: event.stereo_indices().len(),
            n_hits_used: event.flags.n_taken(),
            tracks,
        };
        info!(
            "event done: {} tracks, {}/{} hits used",
            result.tracks.len(),
            result.n_hits_used,
            result.n_hits
        );
        result
    }
}

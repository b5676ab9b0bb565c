//! Residual-based track clean-up between creation and merging: drop hits
//! that disagree with the fitted trajectory, pick up leftover hits that
//! agree with it, refit after each change.

use tracing::debug;

use crate::hit::EventHits;
use crate::track::creator::TrackCreator;
use crate::track::Track;

/// Post-processing switches and thresholds.
#[derive(Debug, Clone, Copy)]
pub struct PostProcessConfig {
    /// Drop hits whose drift residual exceeds `max_hit_residual`.
    pub prune_hits: bool,
    /// Attach untaken axial hits compatible with an existing track.
    pub append_unused: bool,
    /// Largest tolerated |distance-to-trajectory − drift radius|, cm.
    pub max_hit_residual: f64,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            prune_hits: true,
            append_unused: true,
            max_hit_residual: 0.1,
        }
    }
}

/// Drift residual of an event hit against a trajectory.
fn residual(track: &Track, event: &EventHits, hit_index: usize) -> f64 {
    let hit = event.hit(hit_index);
    (track.circle().distance(&hit.pos).abs() - hit.drift_radius).abs()
}

/// Remove badly fitting hits from the track and refit.
///
/// Released hits become available again (`taken` cleared). Returns `false`
/// when the track degenerates (too few surviving hits for a refit); the
/// caller drops it, releasing all its hits.
pub fn prune_bad_hits(
    track: &mut Track,
    event: &mut EventHits,
    creator: &TrackCreator,
    config: &PostProcessConfig,
) -> bool {
    let (keep, lost): (Vec<usize>, Vec<usize>) = track
        .hit_indices()
        .partition(|&i| residual(track, event, i) <= config.max_hit_residual);
    if lost.is_empty() {
        return true;
    }
    debug!("pruning {} of {} hits", lost.len(), track.n_hits());
    for &i in &lost {
        event.flags.set_taken(i, false);
    }

    let seed = track.circle();
    match creator.build_track(&keep, event, &seed, None) {
        Some(refit) => {
            *track = refit;
            true
        }
        None => {
            for &i in &keep {
                event.flags.set_taken(i, false);
            }
            false
        }
    }
}

/// Attach every usable axial hit to the best-matching track, if any track
/// matches within the residual cut; refit the tracks that grew.
pub fn append_unused_hits(
    tracks: &mut [Track],
    event: &mut EventHits,
    creator: &TrackCreator,
    config: &PostProcessConfig,
) {
    let mut grown = vec![false; tracks.len()];
    for i in 0..event.len() {
        if !event.flags.is_usable(i) || event.hit(i).kind != crate::hit::WireKind::Axial {
            continue;
        }
        let mut best: Option<(usize, f64)> = None;
        for (t, track) in tracks.iter().enumerate() {
            if track.circle().is_null() {
                continue;
            }
            let r = residual(track, event, i);
            if r <= config.max_hit_residual && best.is_none_or(|(_, br)| r < br) {
                best = Some((t, r));
            }
        }
        if let Some((t, _)) = best {
            let wire = event.hit(i).wire;
            if tracks[t].contains_wire(wire) {
                continue;
            }
            let mut ids: Vec<usize> = tracks[t].hit_indices().collect();
            ids.push(i);
            let seed = tracks[t].circle();
            if let Some(refit) = creator.build_track(&ids, event, &seed, None) {
                tracks[t] = refit;
                event.flags.set_taken(i, true);
                grown[t] = true;
            }
        }
    }
    let n_grown = grown.iter().filter(|g| **g).count();
    if n_grown > 0 {
        debug!("appended leftover hits to {} tracks", n_grown);
    }
}

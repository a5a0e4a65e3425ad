//! Observable extraction: instant, historical, and blended.
//!
//! [`compute_instant`] is a single pass over the population. The history
//! path ([`compute_from_snapshots`]) only tracks sync, coherence, loop
//! count and event rate; every other field is returned as the neutral
//! placeholder from [`Observables::neutral`]. [`compute`] dials between the
//! two by `time_scope`.
//!
//! Density is read over occupied cells of the 8x8 grid against a fixed
//! per-cell capacity, so a sparse world reads low and a crowded one high.
//! Empty space around the rings shows up in `silence_index` instead.

use glyphloop_types::structs::{SNAPSHOT_GRID, wrap_phase};
use glyphloop_types::{Observables, SessionParams, Snapshot};

use crate::physics::{CENTER, EPS, MAX_SPEED};
use crate::spatial_hash::cell_index;
use crate::state::{SNAPSHOT_CAPACITY, WorldState};

/// Side length of the density grid.
pub const DENSITY_GRID: usize = 8;

/// Below this `time_scope` the blend is skipped entirely.
pub const TIME_SCOPE_CUTOFF: f64 = 0.05;

/// Default number of snapshots in the history window.
pub const DEFAULT_HISTORY_WINDOW: usize = 24;

/// Default rank-weight exponent.
pub const DEFAULT_HISTORY_WEIGHT: f64 = 1.0;

/// Recent-event count that saturates `event_rate`.
const EVENT_SATURATION: f64 = 12.0;

/// Amplification of the snapshot-to-snapshot delta in `novelty`.
const NOVELTY_GAIN: f64 = 4.0;

/// `|intent|` above which a quantum counts as strongly convergent or
/// divergent.
const INTENT_THRESHOLD: f64 = 0.5;

/// Normalized cell density below which a cell counts as silent.
const SILENT_CELL: f64 = 0.05;

/// Quanta per density cell that read as fully crowded.
pub const CELL_CAPACITY: f64 = 24.0;

/// Reduce world state to an observable vector in one pass.
///
/// A world with no quanta yields [`Observables::empty`].
pub fn compute_instant(state: &WorldState) -> Observables {
    let n = state.quanta.len();
    if n == 0 {
        return Observables::empty();
    }
    let nf = n as f64;

    let mut cells = [0_u32; DENSITY_GRID * DENSITY_GRID];
    let mut sin_sum = 0.0;
    let mut cos_sum = 0.0;
    let mut coh_sum = 0.0;
    let mut coh_sq_sum = 0.0;
    let mut loops = 0_u32;
    let mut diagonal_a = 0_u32;
    let mut diagonal_b = 0_u32;
    let mut vx_sum = 0.0;
    let mut vy_sum = 0.0;
    let mut speed_sum = 0.0;
    let mut ink_sum = 0.0;
    let mut convergent = 0_u32;
    let mut divergent = 0_u32;

    for q in &state.quanta {
        let cell = cell_index(q.x, q.y, DENSITY_GRID);
        if let Some(count) = cells.get_mut(cell) {
            *count += 1;
        }

        let (s, c) = q.phase.sin_cos();
        sin_sum += s;
        cos_sum += c;

        coh_sum += q.coherence;
        coh_sq_sum += q.coherence * q.coherence;
        if q.loop_factor() > 0.5 {
            loops += 1;
        }

        // Quadrants 0/3 (lower-left, upper-right) against 1/2.
        let left = q.x < CENTER.0;
        let low = q.y < CENTER.1;
        if left == low {
            diagonal_a += 1;
        } else {
            diagonal_b += 1;
        }

        vx_sum += q.vx;
        vy_sum += q.vy;
        speed_sum += q.vx.hypot(q.vy);
        ink_sum += q.ink;

        if q.intent < -INTENT_THRESHOLD {
            convergent += 1;
        } else if q.intent > INTENT_THRESHOLD {
            divergent += 1;
        }
    }

    // Density: occupied cells only, each measured against a fixed
    // per-cell capacity so a crowded cell reads 1 whatever the population.
    let mut occupied = 0_u32;
    let mut d_sum = 0.0;
    let mut d_sq_sum = 0.0;
    let mut silent = 0_u32;
    for &count in &cells {
        let d = cell_density(count);
        if d < SILENT_CELL {
            silent += 1;
        }
        if count > 0 {
            occupied += 1;
            d_sum += d;
            d_sq_sum += d * d;
        }
    }
    let occupied = f64::from(occupied.max(1));
    let density_mean = d_sum / occupied;
    // Variance of a [0, 1] variable is at most 0.25.
    let density_variance = (d_sq_sum / occupied - density_mean * density_mean).max(0.0) * 4.0;

    let coherence_mean = coh_sum / nf;
    let coherence_variance =
        (coh_sq_sum / nf - coherence_mean * coherence_mean).max(0.0) * 4.0;

    let mean_vx = vx_sum / nf;
    let mean_vy = vy_sum / nf;
    let polarity_axis = if mean_vx.hypot(mean_vy) > EPS {
        wrap_phase(mean_vy.atan2(mean_vx))
    } else {
        0.0
    };

    Observables {
        density_mean,
        density_variance,
        sync_index: sin_sum.hypot(cos_sum) / nf,
        coherence_mean,
        coherence_variance,
        loop_count: f64::from(loops) / nf,
        symmetry_index: 1.0 - f64::from(diagonal_a.abs_diff(diagonal_b)) / nf,
        polarity_axis,
        event_rate: state.recent_events / EVENT_SATURATION,
        novelty: snapshot_novelty(state),
        tension_index: f64::from(convergent.abs_diff(divergent)) / nf,
        silence_index: f64::from(silent) / cells.len() as f64,
        flow_magnitude: speed_sum / nf / MAX_SPEED,
        ink_level: ink_sum / nf,
    }
    .clamped()
}

/// Rank-weighted average of the tracked fields over the last `window`
/// snapshots.
///
/// The oldest snapshot in the window has rank 1 and the newest rank
/// `window`; each contributes `rank ^ weight`. Weights depend on position
/// in the buffer, not on snapshot age in seconds. Untracked fields are
/// fixed neutral placeholders. Returns `None` when there are no
/// snapshots.
pub fn compute_from_snapshots(
    state: &WorldState,
    window: usize,
    weight: f64,
) -> Option<Observables> {
    let take = window.clamp(1, SNAPSHOT_CAPACITY).min(state.snapshots.len());
    if take == 0 {
        return None;
    }
    let skip = state.snapshots.len() - take;
    let exponent = if weight.is_finite() { weight.max(0.0) } else { 1.0 };

    let mut total = 0.0;
    let mut sync = 0.0;
    let mut coherence = 0.0;
    let mut loop_count = 0.0;
    let mut event_rate = 0.0;
    for (rank, snap) in state.snapshots.iter().skip(skip).enumerate() {
        let w = (rank as f64 + 1.0).powf(exponent);
        total += w;
        sync += w * snap.sync;
        coherence += w * snap.coherence;
        loop_count += w * snap.loop_count;
        event_rate += w * snap.event_rate;
    }
    let total = total.max(EPS);

    Some(
        Observables {
            sync_index: sync / total,
            coherence_mean: coherence / total,
            loop_count: loop_count / total,
            event_rate: event_rate / total,
            ..Observables::neutral()
        }
        .clamped(),
    )
}

/// Observables for the glyph cycle, using the default history window.
pub fn compute(state: &WorldState, params: &SessionParams) -> Observables {
    compute_blended(state, params, DEFAULT_HISTORY_WINDOW, DEFAULT_HISTORY_WEIGHT)
}

/// Blend instant and historical observables by `params.time_scope`.
///
/// Below [`TIME_SCOPE_CUTOFF`] (or with no snapshots yet) the instant
/// reading is returned unchanged.
pub fn compute_blended(
    state: &WorldState,
    params: &SessionParams,
    window: usize,
    weight: f64,
) -> Observables {
    let instant = compute_instant(state);
    let scope = if params.time_scope.is_finite() {
        params.time_scope.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if scope < TIME_SCOPE_CUTOFF {
        return instant;
    }
    compute_from_snapshots(state, window, weight)
        .map_or(instant, |historical| instant.lerp(&historical, scope))
}

/// Append a snapshot of the current state, dropping the oldest beyond
/// [`SNAPSHOT_CAPACITY`].
pub(crate) fn record_snapshot(state: &mut WorldState) {
    let obs = compute_instant(state);
    let mut occupancy = vec![0_u16; SNAPSHOT_GRID * SNAPSHOT_GRID];
    for q in &state.quanta {
        let cell = cell_index(q.x, q.y, SNAPSHOT_GRID);
        if let Some(count) = occupancy.get_mut(cell) {
            *count = count.saturating_add(1);
        }
    }
    state.snapshots.push_back(Snapshot {
        time: state.time,
        occupancy,
        sync: obs.sync_index,
        coherence: obs.coherence_mean,
        loop_count: obs.loop_count,
        event_rate: obs.event_rate,
    });
    while state.snapshots.len() > SNAPSHOT_CAPACITY {
        state.snapshots.pop_front();
    }
}

/// Crowding of one density cell, saturating at [`CELL_CAPACITY`].
fn cell_density(count: u32) -> f64 {
    (f64::from(count) / CELL_CAPACITY).min(1.0)
}

/// Amplified, clamped change in sync and coherence between the last two
/// snapshots.
fn snapshot_novelty(state: &WorldState) -> f64 {
    let mut recent = state.snapshots.iter().rev();
    match (recent.next(), recent.next()) {
        (Some(last), Some(prev)) => {
            let delta = (last.sync - prev.sync).abs() + (last.coherence - prev.coherence).abs();
            (delta * NOVELTY_GAIN).min(1.0)
        }
        _ => 0.0,
    }
}

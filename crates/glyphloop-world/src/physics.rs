//! The per-step integrator.
//!
//! One call to [`step`] runs three stages:
//!
//! 1. **Active perturbations** -- every live [`GlyphAct`] ages by `dt` and
//!    applies its operator effect with a linear falloff (see [`crate::acts`]).
//! 2. **Per-quantum physics** -- phase advance, breathing ring spring,
//!    orbital drive, neighbor phase entrainment, ferrofluid coupling,
//!    boundary and core forces, splatter bursts, then velocity clamp,
//!    damping, integration and ink regeneration.
//! 3. **Snapshot** -- once `snapshot_interval` has elapsed, append a
//!    capped [`Snapshot`](glyphloop_types::Snapshot).
//!
//! The step is exception-free: `dt <= 0` is a no-op, `dt` is clamped to
//! [`MAX_DT`], and every division is epsilon-guarded.

use core::f64::consts::PI;

use glyphloop_types::structs::wrap_phase;
use glyphloop_types::{GlyphAct, SessionParams};
use rand::Rng;
use tracing::trace;

use crate::acts::apply_active_acts;
use crate::observe::record_snapshot;
use crate::state::{WorldState, orbit_sign};

/// Upper bound on a single integration step, in seconds.
pub const MAX_DT: f64 = 0.05;

/// Maximum speed of a quantum, in world units per second.
pub const MAX_SPEED: f64 = 0.25;

/// Division guard.
pub const EPS: f64 = 1e-9;

/// World center.
pub const CENTER: (f64, f64) = (0.5, 0.5);

const NEIGHBOR_RADIUS: f64 = 0.10;
const ALIGN_THRESHOLD: f64 = 0.55;
const ATTRACT_MIN: f64 = 0.012;
const ATTRACT_MAX: f64 = 0.08;
const SEPARATION_RADIUS: f64 = 0.015;
const BOUNDARY_RADIUS: f64 = 0.44;
const CORE_RADIUS: f64 = 0.03;

const BASE_STIFFNESS: f64 = 1.6;
const STIFFNESS_BIAS: f64 = 1.2;
const ORBITAL_FORCE: f64 = 0.06;
const PHASE_COUPLING: f64 = 1.5;
const COHERENCE_GAIN: f64 = 0.12;
const COHERENCE_LOSS: f64 = 0.08;
const FERRO_FORCE: f64 = 0.02;
const SEPARATION_FORCE: f64 = 0.8;
const BOUNDARY_FORCE: f64 = 4.0;
const CORE_FORCE: f64 = 3.0;

const SPLATTER_AFFINITY: f64 = 0.72;
const SPLATTER_TRIGGER: f64 = 0.85;
const SPLATTER_RATE: f64 = 4.0;
const SPLATTER_INK_COST: f64 = 0.05;

const DAMPING: f64 = 0.96;
const INK_REGEN: f64 = 0.02;
const WORLD_MIN: f64 = 0.02;
const WORLD_MAX: f64 = 0.98;

/// Half-life style decay of the recent-event counter, per second.
const EVENT_DECAY: f64 = 0.5;

/// Smallest accepted snapshot interval.
const MIN_SNAPSHOT_INTERVAL: f64 = 0.05;

/// Advance the world by one time-step.
///
/// `acts` is the driver's active act list: each act's remaining duration
/// is decremented here and expired acts are removed.
pub fn step(state: &mut WorldState, params: &SessionParams, dt: f64, acts: &mut Vec<GlyphAct>) {
    if dt.is_nan() || dt <= 0.0 {
        return;
    }
    let dt = dt.min(MAX_DT);

    state.tick = state.tick.saturating_add(1);
    state.time += dt;

    // --- Stage 1: active perturbations ---
    apply_active_acts(&mut state.quanta, acts, dt);

    // --- Stage 2: per-quantum physics ---
    integrate(state, params, dt);
    state.recent_events *= EVENT_DECAY.mul_add(-dt, 1.0).max(0.0);

    // --- Stage 3: snapshot ---
    state.since_snapshot += dt;
    if state.since_snapshot >= params.snapshot_interval.max(MIN_SNAPSHOT_INTERVAL) {
        state.since_snapshot = 0.0;
        record_snapshot(state);
    }

    trace!(tick = state.tick, time = state.time, acts = acts.len(), "World stepped");
}

/// Signed shortest angular difference `to - from`, in `(-pi, pi]`.
pub fn angle_diff(to: f64, from: f64) -> f64 {
    let d = (to - from).rem_euclid(2.0 * PI);
    if d > PI { d - 2.0 * PI } else { d }
}

/// Three-harmonic breathing offset of the ring target radius.
///
/// The third harmonic is keyed by quantum id so neighbors do not breathe
/// in lockstep.
fn breathing(time: f64, id: u32, dance: f64) -> f64 {
    let slow = 0.012 * (time * 0.7).sin();
    let mid = 0.008 * time.mul_add(1.3, 1.7).sin();
    let own = 0.005 * f64::from(id).mul_add(0.37, time * 2.1).sin();
    dance * (slow + mid + own)
}

#[allow(clippy::too_many_lines)]
fn integrate(state: &mut WorldState, params: &SessionParams, dt: f64) {
    let WorldState {
        quanta,
        grid,
        rng,
        time,
        recent_events,
        ..
    } = state;
    let t = *time;

    // Neighbor queries read start-of-step positions and phases so the
    // result does not depend on update order.
    let field: Vec<(f64, f64, f64)> = quanta.iter().map(|q| (q.x, q.y, q.phase)).collect();
    grid.rebuild(field.iter().map(|&(x, y, _)| (x, y)));

    let dance = params.dance.clamp(0.0, 2.0);
    let entrainment = params.entrainment.clamp(0.0, 2.0);
    let stiffness = STIFFNESS_BIAS.mul_add(params.loop_threshold.clamp(0.0, 1.0), BASE_STIFFNESS)
        * 0.25f64.mul_add((t * 0.5).sin(), 1.0);

    for (i, q) in quanta.iter_mut().enumerate() {
        q.phase = wrap_phase(q.phase_vel.mul_add(dt * (0.5 + dance), q.phase));

        let dx = q.x - CENTER.0;
        let dy = q.y - CENTER.1;
        let r = dx.hypot(dy);
        let (ux, uy) = if r > EPS {
            (dx / r, dy / r)
        } else {
            let (s, c) = q.phase.sin_cos();
            (c, s)
        };

        let mut ax = 0.0;
        let mut ay = 0.0;

        // Ring spring toward the breathing target radius.
        let target = q.band.target_radius() + breathing(t, q.id, dance);
        let spring = -(r - target) * stiffness;
        ax += spring * ux;
        ay += spring * uy;

        // Orbital drive; sign follows intent, magnitude follows coherence.
        let tangential =
            ORBITAL_FORCE * dance * 0.7f64.mul_add(q.coherence, 0.3) * orbit_sign(q.intent);
        ax += -uy * tangential;
        ay += ux * tangential;

        // Neighbor pass: circular-mean phase plus ferrofluid coupling.
        let (qx, qy, own_phase) = (q.x, q.y, q.phase);
        let mut sin_sum = 0.0;
        let mut cos_sum = 0.0;
        let mut neighbors = 0_u32;
        grid.for_each_candidate(qx, qy, NEIGHBOR_RADIUS, |j| {
            if j == i {
                return;
            }
            let Some(&(nx, ny, n_phase)) = field.get(j) else {
                return;
            };
            let ox = nx - qx;
            let oy = ny - qy;
            let d = ox.hypot(oy);
            if d > NEIGHBOR_RADIUS {
                return;
            }
            sin_sum += n_phase.sin();
            cos_sum += n_phase.cos();
            neighbors += 1;

            let inv_d = 1.0 / d.max(EPS);
            if d < SEPARATION_RADIUS {
                let push = (SEPARATION_RADIUS - d) / SEPARATION_RADIUS * SEPARATION_FORCE;
                ax -= ox * inv_d * push;
                ay -= oy * inv_d * push;
            }
            if d > ATTRACT_MIN && d < ATTRACT_MAX {
                let similarity = 0.5 * (1.0 + (n_phase - own_phase).cos());
                let pull = FERRO_FORCE * similarity * entrainment;
                ax += ox * inv_d * pull;
                ay += oy * inv_d * pull;
            }
        });

        if neighbors > 0 {
            let mean_phase = sin_sum.atan2(cos_sum);
            let delta = angle_diff(mean_phase, q.phase);
            q.phase = wrap_phase((entrainment * PHASE_COUPLING * dt).mul_add(delta.sin(), q.phase));
            if delta.cos() > ALIGN_THRESHOLD {
                q.coherence += COHERENCE_GAIN * dt * (0.5 + entrainment);
            } else {
                q.coherence -= COHERENCE_LOSS * dt;
            }
        } else {
            q.coherence -= COHERENCE_LOSS * 0.5 * dt;
        }

        // Soft boundary and core exclusion.
        if r > BOUNDARY_RADIUS {
            let push = (r - BOUNDARY_RADIUS) * BOUNDARY_FORCE;
            ax -= ux * push;
            ay -= uy * push;
        }
        if r < CORE_RADIUS {
            let push = (CORE_RADIUS - r) * CORE_FORCE;
            ax += ux * push;
            ay += uy * push;
        }

        // Splatter burst for high-affinity quanta at the crest of their
        // triple-phase cycle.
        if q.scribe_affinity > SPLATTER_AFFINITY
            && (q.phase * 3.0).sin() > SPLATTER_TRIGGER
            && rng.random::<f64>() < SPLATTER_RATE * dt
        {
            let kick: f64 = rng.random_range(0.02..0.06);
            let spread: f64 = rng.random_range(-0.6..0.6);
            let (s, c) = (q.phase + spread).sin_cos();
            q.vx += 0.7f64.mul_add(ux, 0.3 * c) * kick;
            q.vy += 0.7f64.mul_add(uy, 0.3 * s) * kick;
            q.ink -= SPLATTER_INK_COST;
            *recent_events += 1.0;
        }

        // Integrate.
        q.vx = ax.mul_add(dt, q.vx);
        q.vy = ay.mul_add(dt, q.vy);
        let speed = q.vx.hypot(q.vy);
        if speed > MAX_SPEED {
            let scale = MAX_SPEED / speed;
            q.vx *= scale;
            q.vy *= scale;
        }
        q.vx *= DAMPING;
        q.vy *= DAMPING;
        q.x = q.vx.mul_add(dt, q.x).clamp(WORLD_MIN, WORLD_MAX);
        q.y = q.vy.mul_add(dt, q.y).clamp(WORLD_MIN, WORLD_MAX);
        if !q.vx.is_finite() || !q.vy.is_finite() {
            q.vx = 0.0;
            q.vy = 0.0;
        }

        q.ink += INK_REGEN * dt;
        q.clamp_fields();
    }
}

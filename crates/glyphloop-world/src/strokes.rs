//! Stroke deposit, aging, and pruning.
//!
//! Strokes are the slow memory channel of the world. They share the
//! world's random generator but never feed back into physics or the
//! glyph cycle.

use glyphloop_types::{SessionParams, Stroke, StrokePoint};
use rand::Rng;
use tracing::trace;

use crate::state::WorldState;

/// Maximum live strokes; the oldest are dropped first.
pub const MAX_STROKES: usize = 800;

/// Minimum `coherence * scribe_affinity` for a quantum to write.
pub const MIN_LOOP_FACTOR: f64 = 0.35;

/// Minimum ink a quantum needs to write.
pub const MIN_INK: f64 = 0.25;

/// Emission rate per second at loop factor 1.
const EMIT_RATE: f64 = 1.5;

/// Seconds of velocity the polyline extrapolates over.
const EXTRAPOLATION: f64 = 0.6;

/// Vertices per stroke.
const POINTS: usize = 5;

/// Ink consumed per stroke at loop factor 1.
const INK_COST: f64 = 0.12;

/// Age existing strokes, prune expired ones, then let eligible quanta
/// deposit new strokes.
///
/// A `dt` that is non-finite or not positive is a no-op.
pub fn deposit_strokes(state: &mut WorldState, params: &SessionParams, dt: f64) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }

    let WorldState {
        quanta,
        strokes,
        rng,
        ..
    } = state;

    for stroke in strokes.iter_mut() {
        stroke.age_by(dt);
    }
    strokes.retain(|s| !s.is_expired());

    let max_age = params.stroke_max_age();
    let mut emitted = 0_usize;
    for q in quanta.iter_mut() {
        let lf = q.loop_factor();
        if lf < MIN_LOOP_FACTOR || q.ink < MIN_INK {
            continue;
        }
        let chance = lf * dt * EMIT_RATE;
        if rng.random::<f64>() >= chance {
            continue;
        }

        let points = (0..POINTS)
            .map(|i| {
                let t = EXTRAPOLATION * i as f64 / (POINTS - 1) as f64;
                StrokePoint {
                    x: q.vx.mul_add(t, q.x).clamp(0.0, 1.0),
                    y: q.vy.mul_add(t, q.y).clamp(0.0, 1.0),
                }
            })
            .collect();
        let alpha = 0.5f64.mul_add(q.coherence, 0.3).min(1.0);
        strokes.push(Stroke {
            points,
            thickness: 0.003f64.mul_add(q.charge, 0.0015),
            initial_alpha: alpha,
            alpha,
            age: 0.0,
            max_age,
        });
        q.ink = INK_COST.mul_add(-lf, q.ink).max(0.0);
        emitted += 1;
    }

    if strokes.len() > MAX_STROKES {
        let excess = strokes.len() - MAX_STROKES;
        strokes.drain(..excess);
    }

    if emitted > 0 {
        trace!(emitted, live = strokes.len(), "Strokes deposited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create;

    fn params(count: usize) -> SessionParams {
        SessionParams {
            agent_count: count,
            seed: 42,
            ..SessionParams::default()
        }
    }

    fn writer_world(count: usize) -> WorldState {
        let mut world = create(&params(count));
        for q in &mut world.quanta {
            q.coherence = 1.0;
            q.scribe_affinity = 1.0;
            q.ink = 1.0;
        }
        world
    }

    #[test]
    fn strokes_fade_to_exactly_zero_and_are_pruned() {
        let p = params(0);
        let mut world = create(&p);
        world.strokes.push(Stroke {
            points: Vec::new(),
            thickness: 0.002,
            initial_alpha: 0.8,
            alpha: 0.8,
            age: 0.0,
            max_age: 1.0,
        });
        let mut last = 0.8;
        for _ in 0..9 {
            deposit_strokes(&mut world, &p, 0.1);
            let alpha = world.strokes.first().map_or(0.0, |s| s.alpha);
            assert!(alpha <= last);
            last = alpha;
        }
        deposit_strokes(&mut world, &p, 0.2);
        assert!(world.strokes.is_empty());
    }

    #[test]
    fn ineligible_quanta_never_write() {
        let p = params(100);
        let mut world = create(&p);
        for q in &mut world.quanta {
            q.coherence = 0.2;
            q.ink = 1.0;
        }
        for _ in 0..200 {
            deposit_strokes(&mut world, &p, 0.05);
        }
        assert!(world.strokes.is_empty());
    }

    #[test]
    fn writing_consumes_ink_and_uses_current_lifetime() {
        let mut p = params(200);
        p.ink_decay = 1.0;
        let mut world = writer_world(200);
        for _ in 0..20 {
            deposit_strokes(&mut world, &p, 0.05);
        }
        assert!(!world.strokes.is_empty());
        assert!(world.quanta.iter().any(|q| q.ink < 1.0));
        for s in &world.strokes {
            assert!((s.max_age - 30.0).abs() < f64::EPSILON);
            assert_eq!(s.points.len(), POINTS);
            assert!(s.thickness >= 0.0015 && s.thickness <= 0.0045);
        }
    }

    #[test]
    fn stroke_population_is_capped() {
        let p = params(1_000);
        let mut world = writer_world(1_000);
        for _ in 0..400 {
            for q in &mut world.quanta {
                q.ink = 1.0;
            }
            deposit_strokes(&mut world, &p, 0.05);
            assert!(world.strokes.len() <= MAX_STROKES);
        }
        assert_eq!(world.strokes.len(), MAX_STROKES);
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let p = params(50);
        let mut world = writer_world(50);
        deposit_strokes(&mut world, &p, 0.0);
        deposit_strokes(&mut world, &p, f64::NAN);
        assert!(world.strokes.is_empty());
    }
}

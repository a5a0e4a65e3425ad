//! Operator effect table for active glyph acts.
//!
//! Every quantum within an act's radius receives
//! `f = (1 - dist / radius) * strength * dt` scaled by the operator:
//!
//! | Operator | Effect |
//! |----------|--------|
//! | Converge | intent -= 3f, coherence += 2f, velocity pulled toward target x 4f |
//! | Diverge  | intent += 3f, coherence -= 2f, velocity pushed away x 3f |
//! | Silence  | velocity x= (1 - 4f), ink -= 2f |
//! | Amplify  | ink += 3f, `scribe_affinity` += 2f |
//! | Cut      | inner 30% of radius only: outward impulse x 5f |

use glyphloop_types::{GlyphAct, InkQuantum, OperatorKind};

use crate::physics::EPS;

/// Fraction of the act radius affected by [`OperatorKind::Cut`].
const CUT_CORE: f64 = 0.3;

/// Age every live act by `dt`, apply its effect, then drop expired acts.
pub fn apply_active_acts(quanta: &mut [InkQuantum], acts: &mut Vec<GlyphAct>, dt: f64) {
    for act in acts.iter_mut() {
        if !act.is_active() {
            continue;
        }
        act.remaining -= dt;
        let radius = act.radius.max(EPS);
        for q in quanta.iter_mut() {
            let dx = q.x - act.target_x;
            let dy = q.y - act.target_y;
            let dist = dx.hypot(dy);
            if dist > radius {
                continue;
            }
            let f = (1.0 - dist / radius) * act.strength * dt;
            apply_effect(q, act.kind, dx, dy, dist, radius, f);
            q.clamp_fields();
        }
    }
    acts.retain(GlyphAct::is_active);
}

/// Apply one operator to one quantum. `(dx, dy)` points from the act
/// target to the quantum.
fn apply_effect(
    q: &mut InkQuantum,
    kind: OperatorKind,
    dx: f64,
    dy: f64,
    dist: f64,
    radius: f64,
    f: f64,
) {
    match kind {
        OperatorKind::Converge => {
            q.intent -= 3.0 * f;
            q.coherence += 2.0 * f;
            q.vx -= dx * 4.0 * f;
            q.vy -= dy * 4.0 * f;
        }
        OperatorKind::Diverge => {
            q.intent += 3.0 * f;
            q.coherence -= 2.0 * f;
            q.vx += dx * 3.0 * f;
            q.vy += dy * 3.0 * f;
        }
        OperatorKind::Silence => {
            let damp = 4.0f64.mul_add(-f, 1.0).max(0.0);
            q.vx *= damp;
            q.vy *= damp;
            q.ink -= 2.0 * f;
        }
        OperatorKind::Amplify => {
            q.ink += 3.0 * f;
            q.scribe_affinity += 2.0 * f;
        }
        OperatorKind::Cut => {
            if dist < CUT_CORE * radius {
                let (ux, uy) = if dist > EPS {
                    (dx / dist, dy / dist)
                } else {
                    let (s, c) = q.phase.sin_cos();
                    (c, s)
                };
                q.vx += ux * 5.0 * f;
                q.vy += uy * 5.0 * f;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glyphloop_types::RingBand;

    use super::*;

    fn quantum(x: f64, y: f64) -> InkQuantum {
        InkQuantum {
            id: 0,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            phase: 1.0,
            phase_vel: 1.0,
            charge: 0.5,
            coherence: 0.5,
            intent: 0.0,
            ink: 0.5,
            scribe_affinity: 0.5,
            band: RingBand::Outer,
        }
    }

    fn act(kind: OperatorKind, remaining: f64) -> GlyphAct {
        GlyphAct {
            glyph_id: "g-00000000-0".to_owned(),
            kind,
            strength: 1.0,
            radius: 0.2,
            remaining,
            target_x: 0.5,
            target_y: 0.5,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn converge_pulls_and_aligns() {
        let mut quanta = vec![quantum(0.6, 0.5)];
        let mut acts = vec![act(OperatorKind::Converge, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        let q = quanta.first().unwrap();
        assert!(q.intent < 0.0);
        assert!(q.coherence > 0.5);
        assert!(q.vx < 0.0, "pulled back toward the target");
    }

    #[test]
    fn diverge_pushes_and_scatters() {
        let mut quanta = vec![quantum(0.6, 0.5)];
        let mut acts = vec![act(OperatorKind::Diverge, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        let q = quanta.first().unwrap();
        assert!(q.intent > 0.0);
        assert!(q.coherence < 0.5);
        assert!(q.vx > 0.0);
    }

    #[test]
    fn silence_damps_and_drains() {
        let mut quanta = vec![quantum(0.5, 0.5)];
        quanta.first_mut().unwrap().vx = 0.1;
        let mut acts = vec![act(OperatorKind::Silence, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        let q = quanta.first().unwrap();
        // f = 0.05 at the center: velocity x 0.8, ink - 0.1.
        assert!((q.vx - 0.08).abs() < 1e-12);
        assert!((q.ink - 0.4).abs() < 1e-12);
    }

    #[test]
    fn amplify_feeds_ink_and_affinity() {
        let mut quanta = vec![quantum(0.5, 0.5)];
        let mut acts = vec![act(OperatorKind::Amplify, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        let q = quanta.first().unwrap();
        assert!((q.ink - 0.65).abs() < 1e-12);
        assert!((q.scribe_affinity - 0.6).abs() < 1e-12);
    }

    #[test]
    fn cut_only_touches_the_inner_core() {
        // 0.05 from target is inside 30% of 0.2; 0.1 is outside.
        let mut quanta = vec![quantum(0.55, 0.5), quantum(0.6, 0.5)];
        let mut acts = vec![act(OperatorKind::Cut, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        let inside = quanta.first().unwrap().vx;
        let outside = quanta.get(1).unwrap().vx;
        assert!(inside > 0.0);
        assert!(outside.abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_radius_is_untouched() {
        let mut quanta = vec![quantum(0.9, 0.9)];
        let before = quanta.clone();
        let mut acts = vec![act(OperatorKind::Diverge, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        assert_eq!(quanta, before);
    }

    #[test]
    fn expired_acts_are_removed_after_their_last_application() {
        let mut quanta = vec![quantum(0.5, 0.5)];
        let mut acts = vec![act(OperatorKind::Amplify, 0.01), act(OperatorKind::Amplify, 1.0)];
        apply_active_acts(&mut quanta, &mut acts, 0.05);
        assert_eq!(acts.len(), 1);
        // Both acts applied this step.
        let ink = quanta.first().unwrap().ink;
        assert!((ink - 0.8).abs() < 1e-12);
    }
}

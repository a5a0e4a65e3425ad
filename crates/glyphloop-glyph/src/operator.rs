//! Speaking a glyph: turning a decoded symbol into a [`GlyphAct`].
//!
//! This is the only place a glyph re-enters the physical substrate. The
//! returned act is pushed into the driver's active-act list, and the
//! simulator applies it on the following steps.

use glyphloop_types::{GlyphAct, GlyphSpec, OperatorKind, SessionParams};
use tracing::debug;

use crate::decoder::{parse, tokens_to_operator};

// ---------------------------------------------------------------------------
// Act sizing: base + intensity term + shape term
// ---------------------------------------------------------------------------

const RADIUS_BASE: f64 = 0.12;
const RADIUS_PER_INTENSITY: f64 = 0.18;
const RADIUS_PER_RING: f64 = 0.02;

const DURATION_BASE: f64 = 3.0;
const DURATION_PER_INTENSITY: f64 = 4.0;
const DURATION_PER_ARC: f64 = 1.0;

const STRENGTH_BASE: f64 = 0.4;
const STRENGTH_PER_INTENSITY: f64 = 0.6;

/// Decode a glyph and resolve its operator through the rule table.
pub fn resolve_operator(spec: &GlyphSpec) -> OperatorKind {
    tokens_to_operator(&parse(spec).tokens)
}

/// Build an act for `spec` aimed at `(target_x, target_y)`.
///
/// With intensity `I = clamp(speak_intensity, 0, 1)`:
///
/// - radius = 0.12 + 0.18 I + 0.02 rings
/// - duration = 3 + 4 I + arcs (seconds)
/// - strength = 0.4 + 0.6 I
pub fn create_glyph_act(
    spec: &GlyphSpec,
    target_x: f64,
    target_y: f64,
    params: &SessionParams,
) -> GlyphAct {
    let intensity = if params.speak_intensity.is_finite() {
        params.speak_intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let counts = spec.counts();
    let kind = resolve_operator(spec);

    let radius = RADIUS_PER_RING.mul_add(
        counts.rings as f64,
        RADIUS_PER_INTENSITY.mul_add(intensity, RADIUS_BASE),
    );
    let duration = DURATION_PER_ARC.mul_add(
        counts.arcs as f64,
        DURATION_PER_INTENSITY.mul_add(intensity, DURATION_BASE),
    );
    let strength = STRENGTH_PER_INTENSITY.mul_add(intensity, STRENGTH_BASE);

    debug!(
        glyph_id = %spec.id,
        operator = %kind,
        radius,
        duration,
        strength,
        "glyph act created"
    );

    GlyphAct {
        glyph_id: spec.id.clone(),
        kind,
        strength,
        radius,
        remaining: duration,
        target_x: clamp_unit(target_x),
        target_y: clamp_unit(target_y),
        timestamp_ms: spec.timestamp_ms,
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 }
}

#[cfg(test)]
mod tests {
    use glyphloop_types::glyph::{Arc, InnerRing};
    use glyphloop_types::{GrammarMode, Observables};

    use super::*;
    use crate::encoder::generate;

    fn params(intensity: f64) -> SessionParams {
        SessionParams {
            speak_intensity: intensity,
            ..SessionParams::default()
        }
    }

    fn spec_with(rings: usize, arcs: usize) -> GlyphSpec {
        let mut spec = generate(&Observables::neutral(), GrammarMode::Linear, 77, None);
        spec.inner_rings = vec![
            InnerRing {
                radius: 0.2,
                thickness: 0.02,
                phase_offset: 0.0,
            };
            rings
        ];
        spec.arcs = vec![
            Arc {
                start: 0.0,
                sweep: 1.0,
                radius: 0.6,
            };
            arcs
        ];
        spec
    }

    #[test]
    fn full_intensity_sizing() {
        let act = create_glyph_act(&spec_with(3, 2), 0.5, 0.5, &params(1.0));
        assert!((act.radius - 0.36).abs() < 1e-12);
        assert!((act.remaining - 9.0).abs() < 1e-12);
        assert!((act.strength - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_intensity_uses_bases() {
        let act = create_glyph_act(&spec_with(1, 0), 0.5, 0.5, &params(0.0));
        assert!((act.radius - 0.14).abs() < 1e-12);
        assert!((act.remaining - 3.0).abs() < 1e-12);
        assert!((act.strength - 0.4).abs() < 1e-12);
    }

    #[test]
    fn act_carries_glyph_identity_and_target() {
        let spec = spec_with(1, 0);
        let act = create_glyph_act(&spec, 0.25, 1.5, &params(0.6));
        assert_eq!(act.glyph_id, spec.id);
        assert_eq!(act.timestamp_ms, 77);
        assert!((act.target_x - 0.25).abs() < f64::EPSILON);
        assert!((act.target_y - 1.0).abs() < f64::EPSILON);
        assert!(act.is_active());
    }

    #[test]
    fn operator_comes_from_the_rule_table() {
        let mut obs = Observables::neutral();
        obs.coherence_mean = 0.1;
        let spec = generate(&obs, GrammarMode::Heptapod, 0, None);
        let act = create_glyph_act(&spec, 0.5, 0.5, &params(0.5));
        assert_eq!(act.kind, OperatorKind::Diverge);
        assert_eq!(resolve_operator(&spec), OperatorKind::Diverge);
    }
}

//! Observable quantization and procedural glyph generation.
//!
//! # Identity versus geometry
//!
//! The signature hash covers exactly eight quantized fields, in this order:
//! sync (0-10), coherence (0-8), loop count (0-8), density (0-8), symmetry
//! (0-6), tension (0-6), novelty (0-6), axis bucket (0-7). Two observable
//! vectors that land in the same buckets share a signature and therefore a
//! lexicon entry.
//!
//! Geometry additionally reads two unhashed buckets (event rate 0-4 and
//! silence 0-6) that drive arcs and blots. The full-precision observables
//! are stored unchanged on the glyph.

use core::f64::consts::TAU;

use glyphloop_types::glyph::{Arc, Axis, Blot, InnerRing, Notch, OuterRing};
use glyphloop_types::structs::wrap_phase;
use glyphloop_types::{GlyphSpec, GrammarMode, Observables};
use tracing::debug;

use crate::mixhash::{derive, mix64, signature_hash, unit};

/// Sync quantization steps.
pub const SYNC_STEPS: u8 = 10;
/// Coherence, loop count and density quantization steps.
pub const FINE_STEPS: u8 = 8;
/// Symmetry, tension and novelty quantization steps.
pub const COARSE_STEPS: u8 = 6;
/// Angular buckets for the polarity axis.
pub const AXIS_BUCKETS: u8 = 8;
/// Event-rate steps (geometry only).
pub const EVENT_STEPS: u8 = 4;
/// Silence steps (geometry only).
pub const SILENCE_STEPS: u8 = 6;

const MAX_INNER_RINGS: usize = 3;
const MAX_NOTCHES: usize = 3;
const MAX_BLOTS: usize = 6;

// Shape-part tags for the per-element mixers.
const PART_RING: u64 = 1;
const PART_NOTCH: u64 = 2;
const PART_ARC: u64 = 3;
const PART_BLOT: u64 = 4;
const PART_OUTER: u64 = 5;

/// The bucketed view of an observable vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantized {
    /// Sync index, `0..=10`.
    pub sync: u8,
    /// Coherence mean, `0..=8`.
    pub coherence: u8,
    /// Loop count, `0..=8`.
    pub loop_count: u8,
    /// Density mean, `0..=8`.
    pub density: u8,
    /// Symmetry index, `0..=6`.
    pub symmetry: u8,
    /// Tension index, `0..=6`.
    pub tension: u8,
    /// Novelty, `0..=6`.
    pub novelty: u8,
    /// Polarity axis bucket, `0..8`.
    pub axis: u8,
    /// Event rate, `0..=4`. Not hashed.
    pub event: u8,
    /// Silence index, `0..=6`. Not hashed.
    pub silence: u8,
}

impl Quantized {
    /// The eight hashed fields in canonical order.
    pub const fn canonical(&self) -> [u8; 8] {
        [
            self.sync,
            self.coherence,
            self.loop_count,
            self.density,
            self.symmetry,
            self.tension,
            self.novelty,
            self.axis,
        ]
    }

    /// Raw 32-bit signature of the canonical fields.
    pub fn signature_value(&self) -> u32 {
        signature_hash(&self.canonical())
    }

    /// Eight lowercase hex characters.
    pub fn signature(&self) -> String {
        format!("{:08x}", self.signature_value())
    }

    /// Centre angle of the axis bucket, in radians.
    pub fn axis_angle(&self) -> f64 {
        f64::from(self.axis) * TAU / f64::from(AXIS_BUCKETS)
    }
}

/// Bucket the eight hashed fields plus the two geometry-only fields.
pub fn quantize(obs: &Observables) -> Quantized {
    let obs = obs.clamped();
    let axis_step = TAU / f64::from(AXIS_BUCKETS);
    let axis = (obs.polarity_axis / axis_step).round() as u64 % u64::from(AXIS_BUCKETS);
    Quantized {
        sync: steps(obs.sync_index, SYNC_STEPS),
        coherence: steps(obs.coherence_mean, FINE_STEPS),
        loop_count: steps(obs.loop_count, FINE_STEPS),
        density: steps(obs.density_mean, FINE_STEPS),
        symmetry: steps(obs.symmetry_index, COARSE_STEPS),
        tension: steps(obs.tension_index, COARSE_STEPS),
        novelty: steps(obs.novelty, COARSE_STEPS),
        axis: u8::try_from(axis).unwrap_or(0),
        event: steps(obs.event_rate, EVENT_STEPS),
        silence: steps(obs.silence_index, SILENCE_STEPS),
    }
}

/// Generate a glyph from observables.
///
/// The id is `g-<signature>-<id_suffix>`, or `g-<signature>-<timestamp_ms>`
/// when no suffix is given.
pub fn generate(
    obs: &Observables,
    mode: GrammarMode,
    timestamp_ms: u64,
    id_suffix: Option<&str>,
) -> GlyphSpec {
    let q = quantize(obs);
    let signature = q.signature();
    let id = match id_suffix {
        Some(suffix) => format!("g-{signature}-{suffix}"),
        None => format!("g-{signature}-{timestamp_ms}"),
    };
    let seed = mix64(u64::from(q.signature_value()));

    let outer = outer_ring(&q, mode, seed);
    let inner_rings = inner_rings(&q, mode, seed, outer.radius);
    let notches = notches(&q, mode, seed);
    let arcs = arcs(&q, mode, seed, outer.radius);
    let blots = blots(&q, seed, outer.radius);
    let axis = Axis {
        angle: q.axis_angle(),
        strength: (1.5 * f64::from(q.sync) / f64::from(SYNC_STEPS)).min(1.0),
    };

    debug!(
        signature = %signature,
        mode = mode.as_str(),
        rings = inner_rings.len(),
        notches = notches.len(),
        arcs = arcs.len(),
        blots = blots.len(),
        "glyph generated"
    );

    GlyphSpec {
        id,
        signature,
        mode,
        outer,
        inner_rings,
        notches,
        arcs,
        blots,
        axis,
        observables: *obs,
        timestamp_ms,
    }
}

// ---------------------------------------------------------------------------
// Shape grammar
// ---------------------------------------------------------------------------

fn outer_ring(q: &Quantized, mode: GrammarMode, seed: u64) -> OuterRing {
    let (base, spread): (f64, f64) = match mode {
        GrammarMode::Linear => (0.05, 0.1),
        GrammarMode::Heptapod => (0.1, 0.3),
        GrammarMode::Recursive => (0.15, 0.25),
        GrammarMode::Experimental => (0.2, 0.6),
    };
    let wobble = 0.1 * unit(derive(seed, PART_OUTER, 0));
    OuterRing {
        radius: 0.16f64.mul_add(fraction(q.coherence, FINE_STEPS), 0.72),
        thickness: 0.03f64.mul_add(fraction(q.density, FINE_STEPS), 0.02),
        roughness: spread
            .mul_add(fraction(q.novelty, COARSE_STEPS), base + wobble)
            .min(1.0),
    }
}

/// One ring always; a second from loop bucket 3 and a third from 6.
/// Recursive mode adds one more, capped at three.
fn inner_ring_count(q: &Quantized, mode: GrammarMode) -> usize {
    let mut count = 1 + usize::from(q.loop_count >= 3) + usize::from(q.loop_count >= 6);
    if mode == GrammarMode::Recursive {
        count += 1;
    }
    count.min(MAX_INNER_RINGS)
}

fn inner_rings(q: &Quantized, mode: GrammarMode, seed: u64, outer: f64) -> Vec<InnerRing> {
    let count = inner_ring_count(q, mode);
    let thickness = 0.01f64.mul_add(fraction(q.coherence, FINE_STEPS), 0.015);
    (0..count)
        .map(|i| InnerRing {
            radius: outer * (i + 1) as f64 / (count + 1) as f64,
            thickness,
            phase_offset: unit(derive(seed, PART_RING, i as u64)) * TAU,
        })
        .collect()
}

fn notch_count(q: &Quantized, mode: GrammarMode, seed: u64) -> usize {
    let count = match mode {
        GrammarMode::Heptapod => 1 + usize::from(q.tension >= 5),
        GrammarMode::Linear => usize::from(q.tension / 2),
        GrammarMode::Recursive => usize::from((q.novelty + q.tension) / 4),
        GrammarMode::Experimental => {
            let extra = unit(derive(seed, PART_NOTCH, u64::MAX)) < 0.25;
            usize::from(q.novelty / 2) + usize::from(extra)
        }
    };
    count.min(MAX_NOTCHES)
}

fn notches(q: &Quantized, mode: GrammarMode, seed: u64) -> Vec<Notch> {
    let count = notch_count(q, mode, seed);
    let jitter: f64 = match mode {
        GrammarMode::Linear => 0.0,
        GrammarMode::Heptapod => 0.05,
        GrammarMode::Recursive => 0.15,
        GrammarMode::Experimental => 0.6,
    };
    let depth_base = if mode == GrammarMode::Heptapod { 0.18 } else { 0.08 };
    let tension = fraction(q.tension, COARSE_STEPS);
    (0..count)
        .map(|i| {
            let r = unit(derive(seed, PART_NOTCH, i as u64));
            let slot = q.axis_angle() + TAU * i as f64 / count as f64;
            Notch {
                angle: wrap_phase(jitter.mul_add(r - 0.5, slot)),
                depth: 0.1f64.mul_add(tension, depth_base),
                width: 0.04f64.mul_add(r, 0.12),
            }
        })
        .collect()
}

fn arc_count(q: &Quantized, mode: GrammarMode) -> usize {
    match mode {
        GrammarMode::Linear => 0,
        GrammarMode::Heptapod => 1 + usize::from(q.symmetry / 2),
        GrammarMode::Recursive | GrammarMode::Experimental => usize::from(q.event),
    }
}

fn arcs(q: &Quantized, mode: GrammarMode, seed: u64, outer: f64) -> Vec<Arc> {
    (0..arc_count(q, mode))
        .map(|i| {
            let a = derive(seed, PART_ARC, i as u64);
            let b = mix64(a);
            Arc {
                start: unit(a) * TAU,
                sweep: 1.2f64.mul_add(unit(b), 0.4),
                radius: outer * 0.2f64.mul_add(unit(mix64(b)), 0.75),
            }
        })
        .collect()
}

fn blots(q: &Quantized, seed: u64, outer: f64) -> Vec<Blot> {
    let count = (usize::from(q.silence / 2) + usize::from(q.density / 3)).min(MAX_BLOTS);
    (0..count)
        .map(|i| {
            let a = derive(seed, PART_BLOT, i as u64);
            let b = mix64(a);
            Blot {
                angle: unit(a) * TAU,
                distance: outer * 0.2f64.mul_add(unit(b), 1.05),
                size: 0.04f64.mul_add(unit(mix64(b)), 0.02),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn steps(v: f64, count: u8) -> u8 {
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    (v * f64::from(count)).round() as u8
}

fn fraction(bucket: u8, steps: u8) -> f64 {
    f64::from(bucket) / f64::from(steps.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs_with(f: impl FnOnce(&mut Observables)) -> Observables {
        let mut obs = Observables::neutral();
        f(&mut obs);
        obs
    }

    #[test]
    fn quantization_rounds_to_nearest_step() {
        let q = quantize(&obs_with(|o| {
            o.sync_index = 0.26;
            o.coherence_mean = 0.94;
            o.symmetry_index = 0.1;
        }));
        assert_eq!(q.sync, 3);
        assert_eq!(q.coherence, 8);
        assert_eq!(q.symmetry, 1);
    }

    #[test]
    fn axis_wraps_into_eight_buckets() {
        let q = quantize(&obs_with(|o| o.polarity_axis = TAU - 0.01));
        assert_eq!(q.axis, 0);
        let q = quantize(&obs_with(|o| o.polarity_axis = TAU / 4.0));
        assert_eq!(q.axis, 2);
    }

    #[test]
    fn same_bucket_same_signature_and_shape() {
        let a = obs_with(|o| o.coherence_mean = 0.61);
        let b = obs_with(|o| o.coherence_mean = 0.63);
        let ga = generate(&a, GrammarMode::Heptapod, 1, None);
        let gb = generate(&b, GrammarMode::Heptapod, 2, None);
        assert_eq!(ga.signature, gb.signature);
        assert_eq!(ga.inner_rings, gb.inner_rings);
        assert_eq!(ga.notches, gb.notches);
        // Full-precision observables are kept.
        assert!((ga.observables.coherence_mean - 0.61).abs() < f64::EPSILON);
    }

    #[test]
    fn id_uses_suffix_or_timestamp() {
        let obs = Observables::neutral();
        let g = generate(&obs, GrammarMode::Linear, 1234, None);
        assert_eq!(g.id, format!("g-{}-1234", g.signature));
        let g = generate(&obs, GrammarMode::Linear, 1234, Some("abc"));
        assert_eq!(g.id, format!("g-{}-abc", g.signature));
        assert_eq!(g.signature.len(), 8);
        assert!(g.signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn inner_rings_follow_loop_bucket() {
        let counts: Vec<usize> = [0.0, 0.4, 0.8]
            .iter()
            .map(|&l| {
                let obs = obs_with(|o| o.loop_count = l);
                generate(&obs, GrammarMode::Heptapod, 0, None).inner_rings.len()
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
        let obs = obs_with(|o| o.loop_count = 0.4);
        assert_eq!(generate(&obs, GrammarMode::Recursive, 0, None).inner_rings.len(), 3);
    }

    #[test]
    fn inner_ring_radii_are_evenly_spaced() {
        let obs = obs_with(|o| o.loop_count = 1.0);
        let g = generate(&obs, GrammarMode::Heptapod, 0, None);
        let radii: Vec<f64> = g.inner_rings.iter().map(|r| r.radius).collect();
        assert_eq!(radii.len(), 3);
        let step = g.outer.radius / 4.0;
        for (i, r) in radii.iter().enumerate() {
            assert!((r - step * (i + 1) as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn heptapod_prefers_one_notch() {
        for t in [0.0, 0.3, 0.6] {
            let obs = obs_with(|o| o.tension_index = t);
            assert_eq!(generate(&obs, GrammarMode::Heptapod, 0, None).notches.len(), 1);
        }
        let obs = obs_with(|o| o.tension_index = 0.95);
        assert_eq!(generate(&obs, GrammarMode::Heptapod, 0, None).notches.len(), 2);
    }

    #[test]
    fn linear_mode_has_no_arcs() {
        let obs = obs_with(|o| {
            o.event_rate = 1.0;
            o.symmetry_index = 1.0;
        });
        assert!(generate(&obs, GrammarMode::Linear, 0, None).arcs.is_empty());
        assert_eq!(generate(&obs, GrammarMode::Heptapod, 0, None).arcs.len(), 4);
        assert_eq!(generate(&obs, GrammarMode::Experimental, 0, None).arcs.len(), 4);
    }

    #[test]
    fn element_counts_stay_in_range_for_every_mode() {
        let modes = [
            GrammarMode::Linear,
            GrammarMode::Heptapod,
            GrammarMode::Recursive,
            GrammarMode::Experimental,
        ];
        for mode in modes {
            for v in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let obs = obs_with(|o| {
                    o.loop_count = v;
                    o.tension_index = v;
                    o.novelty = v;
                    o.silence_index = v;
                    o.density_mean = v;
                    o.coherence_mean = v;
                });
                let g = generate(&obs, mode, 0, None);
                assert!((1..=3).contains(&g.inner_rings.len()));
                assert!(g.notches.len() <= 3);
                assert!(g.blots.len() <= 6);
                assert!((0.70..=0.90).contains(&g.outer.radius));
                assert!((0.0..=1.0).contains(&g.outer.roughness));
                assert!((0.0..=1.0).contains(&g.axis.strength));
            }
        }
    }

    #[test]
    fn linear_notches_sit_on_unjittered_slots() {
        let obs = obs_with(|o| {
            o.tension_index = 1.0;
            o.novelty = 0.0;
        });
        let q = quantize(&obs);
        let g = generate(&obs, GrammarMode::Linear, 0, None);
        assert_eq!(g.notches.len(), 3);
        for (i, notch) in g.notches.iter().enumerate() {
            let slot = wrap_phase(q.axis_angle() + TAU * i as f64 / 3.0);
            assert!((notch.angle - slot).abs() < 1e-12, "notch {i} at {}", notch.angle);
        }
        // Zero novelty leaves base plus wobble.
        assert!((0.05..0.15).contains(&g.outer.roughness));
        let wild = generate(&obs, GrammarMode::Experimental, 0, None);
        assert!((0.2..0.3).contains(&wild.outer.roughness));
    }

    #[test]
    fn axis_strength_saturates() {
        let obs = obs_with(|o| o.sync_index = 0.9);
        let g = generate(&obs, GrammarMode::Heptapod, 0, None);
        assert!((g.axis.strength - 1.0).abs() < f64::EPSILON);
        let obs = obs_with(|o| o.sync_index = 0.2);
        let g = generate(&obs, GrammarMode::Heptapod, 0, None);
        assert!((g.axis.strength - 0.3).abs() < 1e-12);
    }
}

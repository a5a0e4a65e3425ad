//! The bounded 14-dimensional statistical summary of world state.
//!
//! Every field is normalized to `[0, 1]` except [`Observables::polarity_axis`],
//! which is an angle in `[0, 2pi)`. The field order of
//! [`Observables::to_array`] is canonical and is shared by the decoder's
//! embedding.

use core::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::structs::wrap_phase;

/// Number of scalar fields in an observable vector.
pub const OBSERVABLE_FIELDS: usize = 14;

/// Statistical summary of one world state (or a blend of several).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observables {
    /// Mean crowding of the occupied cells of the 8x8 density grid.
    pub density_mean: f64,
    /// Normalized variance of crowding across the occupied cells.
    pub density_variance: f64,
    /// Kuramoto order parameter: magnitude of the mean unit phase vector.
    pub sync_index: f64,
    /// Mean quantum coherence.
    pub coherence_mean: f64,
    /// Normalized coherence variance.
    pub coherence_variance: f64,
    /// Fraction of quanta with `coherence * scribe_affinity > 0.5`.
    pub loop_count: f64,
    /// `1 -` normalized diagonal-quadrant density asymmetry.
    pub symmetry_index: f64,
    /// Angle of the mean velocity, in `[0, 2pi)`.
    pub polarity_axis: f64,
    /// Clamped recent-event counter.
    pub event_rate: f64,
    /// Amplified delta of sync and coherence between the last two snapshots.
    pub novelty: f64,
    /// Imbalance between strongly convergent and divergent quanta.
    pub tension_index: f64,
    /// Fraction of near-empty density cells.
    pub silence_index: f64,
    /// Mean velocity magnitude relative to the speed cap.
    pub flow_magnitude: f64,
    /// Mean ink reservoir.
    pub ink_level: f64,
}

impl Default for Observables {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Observables {
    /// Mid-range values for every bounded field and a zero axis.
    ///
    /// Used as the placeholder for fields the history path does not track.
    pub const fn neutral() -> Self {
        Self {
            density_mean: 0.5,
            density_variance: 0.5,
            sync_index: 0.5,
            coherence_mean: 0.5,
            coherence_variance: 0.5,
            loop_count: 0.5,
            symmetry_index: 0.5,
            polarity_axis: 0.0,
            event_rate: 0.5,
            novelty: 0.5,
            tension_index: 0.5,
            silence_index: 0.5,
            flow_magnitude: 0.5,
            ink_level: 0.5,
        }
    }

    /// Defaults for a world with no quanta: zeros, with symmetry neutral.
    pub const fn empty() -> Self {
        Self {
            density_mean: 0.0,
            density_variance: 0.0,
            sync_index: 0.0,
            coherence_mean: 0.0,
            coherence_variance: 0.0,
            loop_count: 0.0,
            symmetry_index: 0.5,
            polarity_axis: 0.0,
            event_rate: 0.0,
            novelty: 0.0,
            tension_index: 0.0,
            silence_index: 0.0,
            flow_magnitude: 0.0,
            ink_level: 0.0,
        }
    }

    /// All fields in canonical order.
    pub const fn to_array(&self) -> [f64; OBSERVABLE_FIELDS] {
        [
            self.density_mean,
            self.density_variance,
            self.sync_index,
            self.coherence_mean,
            self.coherence_variance,
            self.loop_count,
            self.symmetry_index,
            self.polarity_axis,
            self.event_rate,
            self.novelty,
            self.tension_index,
            self.silence_index,
            self.flow_magnitude,
            self.ink_level,
        ]
    }

    /// Return a copy with every bounded field clamped to `[0, 1]` and the
    /// axis wrapped. Non-finite values collapse to zero.
    pub fn clamped(&self) -> Self {
        let unit = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            density_mean: unit(self.density_mean),
            density_variance: unit(self.density_variance),
            sync_index: unit(self.sync_index),
            coherence_mean: unit(self.coherence_mean),
            coherence_variance: unit(self.coherence_variance),
            loop_count: unit(self.loop_count),
            symmetry_index: unit(self.symmetry_index),
            polarity_axis: wrap_phase(self.polarity_axis),
            event_rate: unit(self.event_rate),
            novelty: unit(self.novelty),
            tension_index: unit(self.tension_index),
            silence_index: unit(self.silence_index),
            flow_magnitude: unit(self.flow_magnitude),
            ink_level: unit(self.ink_level),
        }
    }

    /// Linear blend toward `other` by `t` in `[0, 1]`.
    ///
    /// The polarity axis is blended on the circle so that `0.1` and
    /// `2pi - 0.1` meet at `0`, not at `pi`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| (b - a).mul_add(t, a);
        let (sa, ca) = self.polarity_axis.sin_cos();
        let (sb, cb) = other.polarity_axis.sin_cos();
        let axis = mix(sa, sb).atan2(mix(ca, cb));
        Self {
            density_mean: mix(self.density_mean, other.density_mean),
            density_variance: mix(self.density_variance, other.density_variance),
            sync_index: mix(self.sync_index, other.sync_index),
            coherence_mean: mix(self.coherence_mean, other.coherence_mean),
            coherence_variance: mix(self.coherence_variance, other.coherence_variance),
            loop_count: mix(self.loop_count, other.loop_count),
            symmetry_index: mix(self.symmetry_index, other.symmetry_index),
            polarity_axis: wrap_phase(axis),
            event_rate: mix(self.event_rate, other.event_rate),
            novelty: mix(self.novelty, other.novelty),
            tension_index: mix(self.tension_index, other.tension_index),
            silence_index: mix(self.silence_index, other.silence_index),
            flow_magnitude: mix(self.flow_magnitude, other.flow_magnitude),
            ink_level: mix(self.ink_level, other.ink_level),
        }
        .clamped()
    }

    /// Field-wise absolute difference, used to describe an effect delta.
    pub fn abs_delta(&self, other: &Self) -> [f64; OBSERVABLE_FIELDS] {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0.0; OBSERVABLE_FIELDS];
        for ((slot, x), y) in out.iter_mut().zip(a).zip(b) {
            *slot = (x - y).abs();
        }
        // The axis delta is the shorter way around the circle.
        if let Some(axis) = out.get_mut(7) {
            *axis = axis.min(TAU - *axis) / TAU;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_world_symmetry_is_neutral() {
        let obs = Observables::empty();
        assert!((obs.symmetry_index - 0.5).abs() < f64::EPSILON);
        assert!(obs.sync_index.abs() < f64::EPSILON);
    }

    #[test]
    fn clamped_bounds_every_field() {
        let mut obs = Observables::neutral();
        obs.novelty = 4.0;
        obs.tension_index = -1.0;
        obs.ink_level = f64::NAN;
        obs.polarity_axis = -0.25;
        let c = obs.clamped();
        assert!((c.novelty - 1.0).abs() < f64::EPSILON);
        assert!(c.tension_index.abs() < f64::EPSILON);
        assert!(c.ink_level.abs() < f64::EPSILON);
        assert!((0.0..TAU).contains(&c.polarity_axis));
    }

    #[test]
    fn lerp_blends_axis_on_the_circle() {
        let mut a = Observables::neutral();
        let mut b = Observables::neutral();
        a.polarity_axis = 0.1;
        b.polarity_axis = TAU - 0.1;
        let mid = a.lerp(&b, 0.5);
        let dist = mid.polarity_axis.min(TAU - mid.polarity_axis);
        assert!(dist < 1e-9, "axis midpoint should be near zero, got {}", mid.polarity_axis);
    }

    #[test]
    fn lerp_endpoints() {
        let mut a = Observables::neutral();
        let mut b = Observables::neutral();
        a.sync_index = 0.2;
        b.sync_index = 0.8;
        assert!((a.lerp(&b, 0.0).sync_index - 0.2).abs() < 1e-12);
        assert!((a.lerp(&b, 1.0).sync_index - 0.8).abs() < 1e-12);
        assert!((a.lerp(&b, 0.5).sync_index - 0.5).abs() < 1e-12);
    }
}

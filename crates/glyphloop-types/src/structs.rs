//! Core entity structs for the Glyphloop simulation.
//!
//! Covers the simulated population (`InkQuantum`), the coarse history kept
//! by the world (`Snapshot`), the slow memory channel (`Stroke`), and the
//! perturbation a spoken glyph injects back into the world (`GlyphAct`).

use core::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::enums::{OperatorKind, RingBand};

// ---------------------------------------------------------------------------
// InkQuantum
// ---------------------------------------------------------------------------

/// A single point-like agent in the ring-formation physics model.
///
/// Positions live in the unit square with the world center at
/// `(0.5, 0.5)`. All scalar fields are kept inside their declared ranges
/// by the simulator after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkQuantum {
    /// Stable index within the population.
    pub id: u32,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Horizontal velocity.
    pub vx: f64,
    /// Vertical velocity.
    pub vy: f64,
    /// Oscillator phase in `[0, 2pi)`.
    pub phase: f64,
    /// Natural phase velocity (radians per second).
    pub phase_vel: f64,
    /// Charge in `[0, 1]`.
    pub charge: f64,
    /// Local phase alignment in `[0, 1]`.
    pub coherence: f64,
    /// Convergent (negative) or divergent (positive) bias in `[-1, 1]`.
    pub intent: f64,
    /// Ink reservoir in `[0, 1]`.
    pub ink: f64,
    /// Tendency to write strokes and splatter, in `[0, 1]`.
    pub scribe_affinity: f64,
    /// Ring band chosen at creation.
    pub band: RingBand,
}

impl InkQuantum {
    /// Clamp every bounded field back into its declared range and wrap the
    /// phase into `[0, 2pi)`.
    pub fn clamp_fields(&mut self) {
        self.charge = self.charge.clamp(0.0, 1.0);
        self.coherence = self.coherence.clamp(0.0, 1.0);
        self.intent = self.intent.clamp(-1.0, 1.0);
        self.ink = self.ink.clamp(0.0, 1.0);
        self.scribe_affinity = self.scribe_affinity.clamp(0.0, 1.0);
        self.phase = wrap_phase(self.phase);
    }

    /// `coherence * scribe_affinity`, the stroke and loop propensity.
    pub fn loop_factor(&self) -> f64 {
        self.coherence * self.scribe_affinity
    }
}

/// Wrap an angle into `[0, 2pi)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `2pi`, so the
/// upper bound is re-checked.
pub fn wrap_phase(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Side length of the snapshot occupancy grid.
pub const SNAPSHOT_GRID: usize = 16;

/// A coarse record of world state appended every `snapshot_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated time when the snapshot was taken.
    pub time: f64,
    /// Row-major 16x16 occupancy counts.
    pub occupancy: Vec<u16>,
    /// Kuramoto sync index at snapshot time.
    pub sync: f64,
    /// Mean coherence at snapshot time.
    pub coherence: f64,
    /// Loop count at snapshot time.
    pub loop_count: f64,
    /// Event rate at snapshot time.
    pub event_rate: f64,
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

/// One vertex of a stroke polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// A decaying trail segment left by a high-coherence quantum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Polyline vertices in drawing order.
    pub points: Vec<StrokePoint>,
    /// Line thickness in world units.
    pub thickness: f64,
    /// Alpha at age zero.
    pub initial_alpha: f64,
    /// Current alpha.
    pub alpha: f64,
    /// Seconds since deposit.
    pub age: f64,
    /// Age at which alpha reaches zero.
    pub max_age: f64,
}

impl Stroke {
    /// Alpha for a given age: linear fade from `initial_alpha` to exactly
    /// zero at `max_age`.
    pub fn alpha_at(&self, age: f64) -> f64 {
        if self.max_age <= 0.0 || age >= self.max_age {
            return 0.0;
        }
        let remaining = 1.0 - age.max(0.0) / self.max_age;
        (self.initial_alpha * remaining).max(0.0)
    }

    /// Advance the stroke's age and recompute alpha.
    pub fn age_by(&mut self, dt: f64) {
        self.age += dt;
        self.alpha = self.alpha_at(self.age);
    }

    /// Whether the stroke has fully faded.
    pub fn is_expired(&self) -> bool {
        self.age >= self.max_age
    }
}

// ---------------------------------------------------------------------------
// GlyphAct
// ---------------------------------------------------------------------------

/// A time-limited perturbation created by speaking a glyph.
///
/// The simulator decrements `remaining` each step and drops the act once
/// it reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphAct {
    /// Id of the glyph that was spoken.
    pub glyph_id: String,
    /// Resolved operator.
    pub kind: OperatorKind,
    /// Effect multiplier.
    pub strength: f64,
    /// Radius of influence in world units.
    pub radius: f64,
    /// Remaining duration in seconds.
    pub remaining: f64,
    /// Target x.
    pub target_x: f64,
    /// Target y.
    pub target_y: f64,
    /// Creation timestamp in milliseconds of simulated time.
    pub timestamp_ms: u64,
}

impl GlyphAct {
    /// Whether the act still perturbs the world.
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

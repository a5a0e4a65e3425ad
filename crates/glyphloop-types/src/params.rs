//! The recognized configuration surface of a session.
//!
//! Every field has a serde default so a partial YAML block (or none at
//! all) yields a runnable session.

use serde::{Deserialize, Serialize};

use crate::enums::GrammarMode;

/// Tunable parameters for one simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Number of ink quanta. Fixed for the lifetime of a world.
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,

    /// Seed for the world's random generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Blend between instant (0) and history-weighted (1) observables.
    #[serde(default)]
    pub time_scope: f64,

    /// Orbital and breathing strength.
    #[serde(default = "default_dance")]
    pub dance: f64,

    /// Phase-coupling strength.
    #[serde(default = "default_entrainment")]
    pub entrainment: f64,

    /// Inverse stroke lifetime: `max_age = 60 - ink_decay * 30` seconds.
    #[serde(default = "default_ink_decay")]
    pub ink_decay: f64,

    /// Ring-stiffness bias.
    #[serde(default = "default_loop_threshold")]
    pub loop_threshold: f64,

    /// Operator power used when speaking a glyph.
    #[serde(default = "default_speak_intensity")]
    pub speak_intensity: f64,

    /// Shape-grammar mode for the glyph encoder.
    #[serde(default)]
    pub mode: GrammarMode,

    /// Whether new lexicon entries are sent to the annotator.
    #[serde(default)]
    pub auto_annotate: bool,

    /// Seconds of simulated time between snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: f64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            agent_count: default_agent_count(),
            seed: default_seed(),
            time_scope: 0.0,
            dance: default_dance(),
            entrainment: default_entrainment(),
            ink_decay: default_ink_decay(),
            loop_threshold: default_loop_threshold(),
            speak_intensity: default_speak_intensity(),
            mode: GrammarMode::default(),
            auto_annotate: false,
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

impl SessionParams {
    /// Stroke lifetime in seconds derived from `ink_decay`.
    pub fn stroke_max_age(&self) -> f64 {
        self.ink_decay.clamp(0.0, 1.0).mul_add(-30.0, 60.0)
    }
}

const fn default_agent_count() -> usize {
    600
}

const fn default_seed() -> u64 {
    0x5EED
}

const fn default_dance() -> f64 {
    0.6
}

const fn default_entrainment() -> f64 {
    0.5
}

const fn default_ink_decay() -> f64 {
    0.3
}

const fn default_loop_threshold() -> f64 {
    0.5
}

const fn default_speak_intensity() -> f64 {
    0.6
}

const fn default_snapshot_interval() -> f64 {
    0.5
}

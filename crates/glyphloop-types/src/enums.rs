//! Enumeration types for the Glyphloop simulation.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// The five perturbation kinds a spoken glyph can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorKind {
    /// Pull quanta toward the target and raise coherence.
    Converge,
    /// Push quanta away from the target and lower coherence.
    Diverge,
    /// Damp motion and drain ink.
    Silence,
    /// Feed ink and scribe affinity.
    Amplify,
    /// Outward impulse inside the inner 30% of the act radius.
    Cut,
}

impl OperatorKind {
    /// Canonical uppercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Converge => "CONVERGE",
            Self::Diverge => "DIVERGE",
            Self::Silence => "SILENCE",
            Self::Amplify => "AMPLIFY",
            Self::Cut => "CUT",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shape grammar
// ---------------------------------------------------------------------------

/// Shape-grammar mode used by the glyph encoder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GrammarMode {
    /// Sparse, arc-free glyphs.
    Linear,
    /// Single-notch, symmetry-driven glyphs.
    #[default]
    Heptapod,
    /// Nested rings, event-driven arcs.
    Recursive,
    /// Jittered notches, rough outer ring.
    Experimental,
}

impl GrammarMode {
    /// Lowercase name as used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Heptapod => "heptapod",
            Self::Recursive => "recursive",
            Self::Experimental => "experimental",
        }
    }
}

impl fmt::Display for GrammarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrammarMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "heptapod" => Ok(Self::Heptapod),
            "recursive" => Ok(Self::Recursive),
            "experimental" => Ok(Self::Experimental),
            other => Err(format!("unknown grammar mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Ring bands
// ---------------------------------------------------------------------------

/// The ring a quantum settles into, chosen once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RingBand {
    /// Low-charge quanta hug the core.
    Inner,
    /// The default band.
    Outer,
    /// High scribe-affinity quanta ride the outermost band and splatter.
    Splatter,
}

impl RingBand {
    /// Base target radius of the band, measured from the world center.
    pub const fn target_radius(self) -> f64 {
        match self {
            Self::Inner => 0.12,
            Self::Outer => 0.26,
            Self::Splatter => 0.36,
        }
    }

    /// Band selection: inner if `charge < 0.20`, splatter if
    /// `scribe_affinity > 0.72`, else outer.
    pub fn classify(charge: f64, scribe_affinity: f64) -> Self {
        if charge < 0.20 {
            Self::Inner
        } else if scribe_affinity > 0.72 {
            Self::Splatter
        } else {
            Self::Outer
        }
    }
}

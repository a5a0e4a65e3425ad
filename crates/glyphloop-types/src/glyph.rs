//! Procedural glyph descriptions and their decoded features.
//!
//! A [`GlyphSpec`] is immutable once generated. Its identity is the
//! `signature` hash, which depends only on a quantized subset of the
//! observables; the `observables` field keeps the full-precision vector
//! that produced it.

use serde::{Deserialize, Serialize};

use crate::enums::GrammarMode;
use crate::observables::{OBSERVABLE_FIELDS, Observables};

/// The enclosing ring of a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OuterRing {
    /// Radius relative to the glyph's unit frame.
    pub radius: f64,
    /// Stroke thickness.
    pub thickness: f64,
    /// Edge roughness in `[0, 1]`.
    pub roughness: f64,
}

/// One of the 1-3 concentric inner rings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InnerRing {
    /// Radius relative to the glyph's unit frame.
    pub radius: f64,
    /// Stroke thickness.
    pub thickness: f64,
    /// Deterministic phase offset in `[0, 2pi)`.
    pub phase_offset: f64,
}

/// A cut into the outer ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Notch {
    /// Angular position in radians.
    pub angle: f64,
    /// Depth as a fraction of the outer radius.
    pub depth: f64,
    /// Angular width in radians.
    pub width: f64,
}

/// A partial ring segment between the inner rings and the outer ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Start angle in radians.
    pub start: f64,
    /// Angular sweep in radians.
    pub sweep: f64,
    /// Radius relative to the glyph's unit frame.
    pub radius: f64,
}

/// An ink blot placed around the glyph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blot {
    /// Angular position in radians.
    pub angle: f64,
    /// Distance from the glyph center.
    pub distance: f64,
    /// Blot radius.
    pub size: f64,
}

/// The glyph's principal axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Angle in radians.
    pub angle: f64,
    /// Strength in `[0, 1]`.
    pub strength: f64,
}

/// A complete, content-addressed procedural glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphSpec {
    /// `g-<signature>-<suffix or timestamp>`.
    pub id: String,
    /// Eight lowercase hex characters.
    pub signature: String,
    /// Grammar mode the shape was generated with.
    pub mode: GrammarMode,
    /// Enclosing ring.
    pub outer: OuterRing,
    /// One to three inner rings, innermost first.
    pub inner_rings: Vec<InnerRing>,
    /// Zero to three notches.
    pub notches: Vec<Notch>,
    /// Zero or more arcs.
    pub arcs: Vec<Arc>,
    /// Zero to six blots.
    pub blots: Vec<Blot>,
    /// Principal axis.
    pub axis: Axis,
    /// Full-precision observables the glyph was generated from.
    pub observables: Observables,
    /// Generation timestamp in milliseconds.
    pub timestamp_ms: u64,
}

/// Shape element counts recomputed from a glyph's arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCounts {
    /// Number of inner rings.
    pub rings: usize,
    /// Number of notches.
    pub notches: usize,
    /// Number of arcs.
    pub arcs: usize,
    /// Number of blots.
    pub blots: usize,
}

/// Decoded view of a glyph: counts, categorical bins, tokens, embedding.
///
/// Derived on demand from a [`GlyphSpec`]; never stored inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphFeatures {
    /// Shape element counts.
    pub counts: ShapeCounts,
    /// `LOW`, `MED` or `HIGH`.
    pub symmetry_bin: String,
    /// One of eight compass directions.
    pub axis_bin: String,
    /// `LOW`, `MID` or `HIGH`.
    pub density_bin: String,
    /// `LOW`, `MID` or `HIGH`.
    pub coherence_bin: String,
    /// `LOW`, `MID` or `HIGH`.
    pub tension_bin: String,
    /// `LOW`, `MID` or `HIGH`.
    pub novelty_bin: String,
    /// Shape-count tokens followed by six `CATEGORY_BIN` tokens.
    pub tokens: Vec<String>,
    /// Unit-length embedding for similarity comparisons.
    pub embedding: [f64; OBSERVABLE_FIELDS],
}

impl GlyphSpec {
    /// Recompute element counts from the array lengths.
    pub fn counts(&self) -> ShapeCounts {
        ShapeCounts {
            rings: self.inner_rings.len(),
            notches: self.notches.len(),
            arcs: self.arcs.len(),
            blots: self.blots.len(),
        }
    }
}

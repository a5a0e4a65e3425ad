//! Shared type definitions for the Glyphloop simulation.
//!
//! This crate is the single source of truth for all value types that flow
//! around the simulation -> symbol -> intervention -> simulation loop.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for sessions and annotation requests
//! - [`enums`] -- Operator kinds, grammar modes, ring bands
//! - [`params`] -- [`SessionParams`], the recognized configuration surface
//! - [`structs`] -- Ink quanta, snapshots, strokes, glyph acts
//! - [`observables`] -- The bounded 14-dimensional [`Observables`] vector
//! - [`glyph`] -- Procedural glyph descriptions and decoded features
//! - [`lexicon`] -- Lexicon entries and annotator payloads

pub mod enums;
pub mod glyph;
pub mod ids;
pub mod lexicon;
pub mod observables;
pub mod params;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{GrammarMode, OperatorKind, RingBand};
pub use glyph::{
    Arc, Axis, Blot, GlyphFeatures, GlyphSpec, InnerRing, Notch, OuterRing, ShapeCounts,
};
pub use ids::{AnnotationRequestId, SessionId};
pub use lexicon::{Annotation, AnnotationRequest, EffectDelta, LexiconEntry};
pub use observables::Observables;
pub use params::SessionParams;
pub use structs::{GlyphAct, InkQuantum, Snapshot, Stroke, StrokePoint};

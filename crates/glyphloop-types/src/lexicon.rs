//! Lexicon entries and the annotator payloads that enrich them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::OperatorKind;
use crate::ids::AnnotationRequestId;
use crate::observables::Observables;

/// Human-readable glossary proposal returned by the annotator.
///
/// Every field is required; a response missing any of them fails
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Short gloss.
    pub gloss: String,
    /// One-sentence definition.
    pub definition: String,
    /// Example usage.
    pub usage: String,
    /// Glosses this glyph contrasts with.
    pub contrasts: Vec<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether a human should check the proposal.
    pub needs_verification: bool,
    /// Why the annotator chose this gloss.
    pub rationale: String,
}

/// One distinct glyph in the lexicon, keyed by signature hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Signature hash (lexicon key).
    pub signature: String,
    /// Id of the most recent glyph with this signature.
    pub glyph_id: String,
    /// Decoded tokens of the most recent occurrence.
    pub tokens: Vec<String>,
    /// Operator the tokens resolve to.
    pub operator: OperatorKind,
    /// Number of times this signature has been generated.
    pub frequency: u32,
    /// First generation time.
    pub first_seen: DateTime<Utc>,
    /// Most recent generation time.
    pub last_seen: DateTime<Utc>,
    /// Observables of the most recent occurrence.
    pub observables: Observables,
    /// Advisory annotation, if one has been accepted.
    pub annotation: Option<Annotation>,
}

/// Observables captured just before and a while after a speak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectDelta {
    /// Observables at the moment of speaking.
    pub before: Observables,
    /// Observables at the next macro tick.
    pub after: Observables,
}

/// Everything the annotator receives for one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    /// Request id, for log correlation.
    pub id: AnnotationRequestId,
    /// The entry to annotate.
    pub entry: LexiconEntry,
    /// Recent observables, oldest first.
    pub recent: Vec<Observables>,
    /// Effect of the last speak, when one was recorded.
    pub effect: Option<EffectDelta>,
    /// Labels a human attached to this glyph.
    pub human_labels: Vec<String>,
}

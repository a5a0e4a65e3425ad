//! Glyph decoding: categorical bins, token stream, embedding, and the
//! operator rule table.
//!
//! Shape counts are recomputed from the glyph's arrays, never from the
//! signature. Bins are read from the full-precision observables.

use core::f64::consts::TAU;

use glyphloop_types::observables::OBSERVABLE_FIELDS;
use glyphloop_types::{GlyphFeatures, GlyphSpec, Observables, OperatorKind};

/// Guard for divisions by a norm.
const EPS: f64 = 1e-12;

/// Symmetry below this is `LOW`.
const SYMMETRY_LOW: f64 = 0.4;
/// Symmetry below this (and not `LOW`) is `MED`.
const SYMMETRY_MED: f64 = 0.7;

/// Compass labels, counter-clockwise from east.
const COMPASS: [&str; 8] = ["E", "NE", "N", "NW", "W", "SW", "S", "SE"];

/// Decode a glyph into counts, bins, tokens, and a unit embedding.
///
/// Tokens come in a fixed order: `RINGS_n`, `NOTCHES_n`, `ARCS_n`,
/// `BLOTS_n`, then `SYMMETRY_*`, `AXIS_*`, `DENSITY_*`, `COHERENCE_*`,
/// `TENSION_*`, `NOVELTY_*`.
pub fn parse(spec: &GlyphSpec) -> GlyphFeatures {
    let counts = spec.counts();
    let obs = spec.observables.clamped();

    let symmetry_bin = symmetry_bin(obs.symmetry_index);
    let axis_bin = axis_bin(obs.polarity_axis);
    let density_bin = thirds_bin(obs.density_mean);
    let coherence_bin = thirds_bin(obs.coherence_mean);
    let tension_bin = thirds_bin(obs.tension_index);
    let novelty_bin = thirds_bin(obs.novelty);

    let tokens = vec![
        format!("RINGS_{}", counts.rings),
        format!("NOTCHES_{}", counts.notches),
        format!("ARCS_{}", counts.arcs),
        format!("BLOTS_{}", counts.blots),
        format!("SYMMETRY_{symmetry_bin}"),
        format!("AXIS_{axis_bin}"),
        format!("DENSITY_{density_bin}"),
        format!("COHERENCE_{coherence_bin}"),
        format!("TENSION_{tension_bin}"),
        format!("NOVELTY_{novelty_bin}"),
    ];

    GlyphFeatures {
        counts,
        symmetry_bin: symmetry_bin.to_owned(),
        axis_bin: axis_bin.to_owned(),
        density_bin: density_bin.to_owned(),
        coherence_bin: coherence_bin.to_owned(),
        tension_bin: tension_bin.to_owned(),
        novelty_bin: novelty_bin.to_owned(),
        tokens,
        embedding: embedding(&obs),
    }
}

/// Epsilon-guarded cosine similarity. Mismatched lengths give `0`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    dot / (na.sqrt() * nb.sqrt()).max(EPS)
}

// ---------------------------------------------------------------------------
// Operator rule table
// ---------------------------------------------------------------------------

/// What the rule predicates can see of a token stream.
#[derive(Debug, Clone, Copy, Default)]
struct TokenView {
    coherence_high: bool,
    coherence_low: bool,
    symmetry_high: bool,
    tension_high: bool,
    density_low: bool,
    density_high: bool,
    novelty_low: bool,
    notches: usize,
}

impl TokenView {
    fn read<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut view = Self::default();
        for token in tokens {
            match token.as_ref() {
                "COHERENCE_HIGH" => view.coherence_high = true,
                "COHERENCE_LOW" => view.coherence_low = true,
                "SYMMETRY_HIGH" => view.symmetry_high = true,
                "TENSION_HIGH" => view.tension_high = true,
                "DENSITY_LOW" => view.density_low = true,
                "DENSITY_HIGH" => view.density_high = true,
                "NOVELTY_LOW" => view.novelty_low = true,
                other => {
                    if let Some(n) = other
                        .strip_prefix("NOTCHES_")
                        .and_then(|n| n.parse::<usize>().ok())
                    {
                        view.notches = n;
                    }
                }
            }
        }
        view
    }
}

type Rule = (fn(&TokenView) -> bool, OperatorKind);

/// Ordered rules; the first predicate that holds decides the operator.
const RULES: [Rule; 5] = [
    (|v| v.coherence_high && v.symmetry_high, OperatorKind::Converge),
    (|v| v.coherence_low || v.tension_high, OperatorKind::Diverge),
    (|v| v.density_low && v.novelty_low, OperatorKind::Silence),
    (|v| v.density_high && v.coherence_high, OperatorKind::Amplify),
    (|v| v.notches >= 3, OperatorKind::Cut),
];

/// Operator when no rule matches.
const FALLBACK: OperatorKind = OperatorKind::Converge;

/// Resolve a token stream to an operator. First match wins.
pub fn tokens_to_operator<S: AsRef<str>>(tokens: &[S]) -> OperatorKind {
    let view = TokenView::read(tokens);
    RULES
        .iter()
        .find(|(predicate, _)| predicate(&view))
        .map_or(FALLBACK, |&(_, kind)| kind)
}

// ---------------------------------------------------------------------------
// Bins
// ---------------------------------------------------------------------------

fn symmetry_bin(v: f64) -> &'static str {
    if v < SYMMETRY_LOW {
        "LOW"
    } else if v < SYMMETRY_MED {
        "MED"
    } else {
        "HIGH"
    }
}

fn thirds_bin(v: f64) -> &'static str {
    if v < 1.0 / 3.0 {
        "LOW"
    } else if v < 2.0 / 3.0 {
        "MID"
    } else {
        "HIGH"
    }
}

fn axis_bin(angle: f64) -> &'static str {
    let octant = (angle / (TAU / 8.0)).round() as usize % COMPASS.len();
    COMPASS.get(octant).copied().unwrap_or("E")
}

/// The 14 fields with the axis scaled to `[0, 1)`, normalized to unit
/// length.
fn embedding(obs: &Observables) -> [f64; OBSERVABLE_FIELDS] {
    let mut v = obs.to_array();
    if let Some(axis) = v.get_mut(7) {
        *axis /= TAU;
    }
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt().max(EPS);
    for x in &mut v {
        *x /= norm;
    }
    v
}

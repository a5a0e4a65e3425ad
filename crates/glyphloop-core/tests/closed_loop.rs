//! Integration tests for the full simulation -> glyph -> act -> simulation
//! loop, driven through [`Session`].
//!
//! Every test is deterministic: worlds are seeded and no wall clock feeds
//! the physics.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use glyphloop_core::config::GlyphloopConfig;
use glyphloop_core::session::{MacroTick, Session};
use glyphloop_types::{GrammarMode, Observables, OperatorKind};

const FRAME: f64 = 1.0 / 60.0;

/// Upper bound on frames spent waiting for one macro tick.
const MAX_FRAMES: usize = 10_000;

fn first_tick(session: &mut Session) -> MacroTick {
    (0..MAX_FRAMES)
        .find_map(|_| session.advance(FRAME))
        .expect("no macro tick within the frame budget")
}

fn config_yaml(yaml: &str) -> GlyphloopConfig {
    GlyphloopConfig::parse(yaml).unwrap()
}

#[test]
fn first_contact_glyph_has_expected_shape() {
    let config = config_yaml("preset: first-contact\n");
    assert_eq!(config.session.seed, 0x1F1F1);
    assert_eq!(config.session.agent_count, 720);

    let mut session = Session::new(&config);
    let tick = first_tick(&mut session);
    assert_eq!(tick.glyph.mode, GrammarMode::Heptapod);
    assert!(
        (0.70..=0.90).contains(&tick.glyph.outer.radius),
        "outer radius {}",
        tick.glyph.outer.radius
    );
    let notches = tick.glyph.notches.len();
    assert!(notches == 1 || notches == 2, "notches {notches}");
}

#[test]
fn same_seed_produces_same_glyph_sequence() {
    let yaml = "session:\n  agent_count: 200\n  seed: 77\ndriver:\n  macro_interval: 0.5\n";
    let mut a = Session::new(&config_yaml(yaml));
    let mut b = Session::new(&config_yaml(yaml));
    for _ in 0..5 {
        let ta = first_tick(&mut a);
        let tb = first_tick(&mut b);
        assert_eq!(ta.glyph.signature, tb.glyph.signature);
        assert_eq!(ta.operator, tb.operator);
        assert_eq!(ta.features.tokens, tb.features.tokens);
    }
}

#[test]
fn speaking_perturbs_the_world() {
    let yaml = "session:\n  agent_count: 300\n  seed: 5\n  speak_intensity: 1.0\ndriver:\n  macro_interval: 0.5\n";
    let mut quiet = Session::new(&config_yaml(yaml));
    let mut spoken = Session::new(&config_yaml(yaml));
    first_tick(&mut quiet);
    first_tick(&mut spoken);

    let act = spoken.speak(0.5, 0.5).unwrap();
    assert!(act.remaining > 0.0);
    for _ in 0..60 {
        quiet.advance(FRAME);
        spoken.advance(FRAME);
    }
    let moved = quiet
        .world()
        .quanta
        .iter()
        .zip(&spoken.world().quanta)
        .any(|(q, s)| (q.x - s.x).abs() > 1e-9 || (q.intent - s.intent).abs() > 1e-9);
    assert!(moved);
    assert_eq!(quiet.world().quanta.len(), spoken.world().quanta.len());
}

#[test]
fn acts_expire_after_their_duration() {
    let yaml = "session:\n  agent_count: 100\n  speak_intensity: 0.0\ndriver:\n  macro_interval: 100.0\n";
    let mut session = Session::new(&config_yaml(yaml));
    let tick = session.macro_tick();
    let act = session.speak_glyph(&tick.glyph, 0.5, 0.5);
    // Zero intensity: 3 s plus one second per arc.
    let frames = ((act.remaining / 0.05).ceil() as usize) + 2;
    for _ in 0..frames {
        session.advance(0.05);
    }
    assert!(session.active_acts().is_empty());
}

#[test]
fn recurring_glyphs_accumulate_frequency() {
    let yaml = "session:\n  agent_count: 150\n  seed: 9\ndriver:\n  macro_interval: 0.25\n";
    let mut session = Session::new(&config_yaml(yaml));
    let mut ticks = 0_u32;
    while ticks < 40 {
        if session.advance(0.05).is_some() {
            ticks += 1;
        }
    }
    let total: u32 = session.lexicon().entries().iter().map(|e| e.frequency).sum();
    assert_eq!(total, 40);
    assert!(session.lexicon().len() <= 40);
}

#[test]
fn every_operator_kind_is_reachable_from_tokens() {
    use glyphloop_glyph::tokens_to_operator;
    let cases: [(&[&str], OperatorKind); 5] = [
        (&["COHERENCE_HIGH", "SYMMETRY_HIGH"], OperatorKind::Converge),
        (&["TENSION_HIGH"], OperatorKind::Diverge),
        (&["DENSITY_LOW", "NOVELTY_LOW"], OperatorKind::Silence),
        (&["DENSITY_HIGH", "COHERENCE_HIGH"], OperatorKind::Amplify),
        (&["NOTCHES_3"], OperatorKind::Cut),
    ];
    for (tokens, expected) in cases {
        assert_eq!(tokens_to_operator(tokens), expected);
    }
}

#[test]
fn crowded_world_decodes_as_dense() {
    let yaml = "session:\n  agent_count: 3000\n  seed: 21\ndriver:\n  macro_interval: 100.0\n";
    let mut session = Session::new(&config_yaml(yaml));
    for _ in 0..30 {
        session.advance(FRAME);
    }
    let tick = session.macro_tick();
    assert_eq!(tick.features.density_bin, "HIGH");
    assert!(tick.features.tokens.iter().any(|t| t == "DENSITY_HIGH"));
}

#[test]
fn dense_coherent_glyph_resolves_to_amplify() {
    use glyphloop_glyph::{generate, parse, tokens_to_operator};
    let obs = Observables {
        density_mean: 0.9,
        coherence_mean: 0.9,
        symmetry_index: 0.5,
        tension_index: 0.1,
        novelty: 0.5,
        ..Observables::neutral()
    };
    let glyph = generate(&obs, GrammarMode::Heptapod, 0, Some("amp"));
    let features = parse(&glyph);
    assert_eq!(tokens_to_operator(&features.tokens), OperatorKind::Amplify);
}

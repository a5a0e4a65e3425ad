//! The session driver.
//!
//! A [`Session`] owns exactly one [`WorldState`] and the list of active
//! glyph acts, and runs the driver contract:
//!
//! 1. **Frame** -- [`Session::advance`] clamps the wall-clock delta, steps
//!    the physics, and deposits strokes.
//! 2. **Macro tick** -- every `macro_interval` simulated seconds, observables
//!    are computed, a glyph is generated and decoded, the lexicon is
//!    updated, and the detectors run. The result is a [`MacroTick`].
//! 3. **Speak** -- [`Session::speak`] resolves the latest glyph into a
//!    [`GlyphAct`] and pushes it into the active list; the world applies it
//!    on the following frames.
//!
//! The annotator never runs here. The session only assembles
//! [`AnnotationRequest`]s and applies returned annotations, so a slow or
//! failing annotator cannot block the loop.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use glyphloop_glyph::{create_glyph_act, generate, parse, tokens_to_operator};
use glyphloop_types::{
    Annotation, AnnotationRequest, AnnotationRequestId, EffectDelta, GlyphAct, GlyphFeatures,
    GlyphSpec, Observables, OperatorKind, SessionId, SessionParams,
};
use glyphloop_world::{
    WorldEvent, WorldState, compute_blended, deposit_strokes, narrate, reset, step,
};
use tracing::{debug, info};

use crate::config::{DriverConfig, GlyphloopConfig};
use crate::lexicon::{Lexicon, UpsertOutcome};

/// Recent observables kept for annotation requests.
pub const RECENT_OBSERVABLES: usize = 8;

/// Everything produced by one macro tick.
#[derive(Debug, Clone)]
pub struct MacroTick {
    /// 1-based glyph counter for this session.
    pub index: u64,
    /// Observables the glyph was generated from.
    pub observables: Observables,
    /// The generated glyph.
    pub glyph: GlyphSpec,
    /// Its decoded features.
    pub features: GlyphFeatures,
    /// Operator the tokens resolve to.
    pub operator: OperatorKind,
    /// What the lexicon did with it.
    pub outcome: UpsertOutcome,
    /// Narrated world events at this tick.
    pub events: Vec<WorldEvent>,
}

/// A speak awaiting its "after" observables.
#[derive(Debug, Clone)]
struct PendingEffect {
    signature: String,
    before: Observables,
}

/// One running simulation and its lexicon.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    params: SessionParams,
    driver: DriverConfig,
    world: WorldState,
    acts: Vec<GlyphAct>,
    lexicon: Lexicon,
    since_macro: f64,
    glyph_count: u64,
    last_glyph: Option<GlyphSpec>,
    recent: VecDeque<Observables>,
    pending_effect: Option<PendingEffect>,
    effects: HashMap<String, EffectDelta>,
}

impl Session {
    /// Build a session from a validated configuration.
    pub fn new(config: &GlyphloopConfig) -> Self {
        let params = config.session.clone();
        let world = WorldState::new(&params);
        let id = SessionId::new();
        info!(
            session_id = %id,
            agent_count = params.agent_count,
            seed = params.seed,
            mode = params.mode.as_str(),
            "Session created"
        );
        Self {
            id,
            params,
            driver: config.driver.clone(),
            world,
            acts: Vec::new(),
            lexicon: Lexicon::new(config.lexicon.capacity),
            since_macro: 0.0,
            glyph_count: 0,
            last_glyph: None,
            recent: VecDeque::with_capacity(RECENT_OBSERVABLES),
            pending_effect: None,
            effects: HashMap::new(),
        }
    }

    /// Advance one frame by a wall-clock delta.
    ///
    /// The delta is clamped to `max_frame_dt`; a non-finite or
    /// non-positive delta does nothing. Returns a [`MacroTick`] when this
    /// frame crosses the macro interval.
    pub fn advance(&mut self, wall_dt: f64) -> Option<MacroTick> {
        if !wall_dt.is_finite() || wall_dt <= 0.0 {
            return None;
        }
        let dt = wall_dt.min(self.driver.max_frame_dt);
        step(&mut self.world, &self.params, dt, &mut self.acts);
        deposit_strokes(&mut self.world, &self.params, dt);

        self.since_macro += dt;
        if self.since_macro + 1e-9 < self.driver.macro_interval {
            return None;
        }
        self.since_macro = 0.0;
        Some(self.macro_tick())
    }

    /// Run the observe -> encode -> decode -> lexicon cycle immediately.
    pub fn macro_tick(&mut self) -> MacroTick {
        let observables = self.observe();
        if self.recent.len() == RECENT_OBSERVABLES {
            self.recent.pop_front();
        }
        self.recent.push_back(observables);

        self.glyph_count += 1;
        let index = self.glyph_count;
        let timestamp_ms = (self.world.time * 1000.0).max(0.0) as u64;
        let suffix = index.to_string();
        let glyph = generate(&observables, self.params.mode, timestamp_ms, Some(&suffix));
        let features = parse(&glyph);
        let operator = tokens_to_operator(&features.tokens);
        let outcome = self
            .lexicon
            .upsert(&glyph, &features, operator, Utc::now());
        if let UpsertOutcome::Inserted {
            evicted: Some(evicted),
        } = &outcome
        {
            self.effects.remove(evicted);
        }

        if let Some(pending) = self.pending_effect.take() {
            debug!(signature = %pending.signature, "Speak effect recorded");
            self.effects.insert(
                pending.signature,
                EffectDelta {
                    before: pending.before,
                    after: observables,
                },
            );
        }

        let events = narrate(&self.world);
        for event in &events {
            info!(session_id = %self.id, %event, "World event");
        }

        info!(
            session_id = %self.id,
            index,
            signature = %glyph.signature,
            %operator,
            new = outcome.is_new(),
            sync = observables.sync_index,
            coherence = observables.coherence_mean,
            "Macro tick"
        );

        self.last_glyph = Some(glyph.clone());
        MacroTick {
            index,
            observables,
            glyph,
            features,
            operator,
            outcome,
            events,
        }
    }

    /// Speak the most recent glyph at `(x, y)`.
    ///
    /// Returns `None` before the first macro tick.
    pub fn speak(&mut self, x: f64, y: f64) -> Option<GlyphAct> {
        let glyph = self.last_glyph.clone()?;
        Some(self.speak_glyph(&glyph, x, y))
    }

    /// Speak a specific glyph at `(x, y)`.
    pub fn speak_glyph(&mut self, glyph: &GlyphSpec, x: f64, y: f64) -> GlyphAct {
        let act = create_glyph_act(glyph, x, y, &self.params);
        info!(
            session_id = %self.id,
            glyph_id = %act.glyph_id,
            operator = %act.kind,
            x = act.target_x,
            y = act.target_y,
            "Glyph spoken"
        );
        self.pending_effect = Some(PendingEffect {
            signature: glyph.signature.clone(),
            before: self.observe(),
        });
        self.acts.push(act.clone());
        act
    }

    /// Rebuild the world in place from the session parameters.
    ///
    /// Active acts and the macro clock are cleared. The lexicon is kept.
    pub fn reset(&mut self) {
        reset(&mut self.world, &self.params);
        self.acts.clear();
        self.since_macro = 0.0;
        self.last_glyph = None;
        self.recent.clear();
        self.pending_effect = None;
        info!(session_id = %self.id, "Session reset");
    }

    /// Assemble an annotator request for a lexicon entry.
    ///
    /// Returns `None` if the signature is not in the lexicon.
    pub fn annotation_request(&self, signature: &str) -> Option<AnnotationRequest> {
        let entry = self.lexicon.get(signature)?.clone();
        Some(AnnotationRequest {
            id: AnnotationRequestId::new(),
            entry,
            recent: self.recent.iter().copied().collect(),
            effect: self.effects.get(signature).copied(),
            human_labels: self.lexicon.labels(signature).to_vec(),
        })
    }

    /// Apply an annotator result. Final write wins; returns `false` if the
    /// entry has been evicted since the request was made.
    pub fn apply_annotation(&mut self, signature: &str, annotation: Annotation) -> bool {
        self.lexicon.apply_annotation(signature, annotation)
    }

    /// Attach a human label to a lexicon entry.
    pub fn add_label(&mut self, signature: &str, label: &str) -> bool {
        self.lexicon.add_label(signature, label)
    }

    /// Session id.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Session parameters.
    pub const fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Driver timing.
    pub const fn driver(&self) -> &DriverConfig {
        &self.driver
    }

    /// Read-only view of the world.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// The lexicon.
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Acts still perturbing the world.
    pub fn active_acts(&self) -> &[GlyphAct] {
        &self.acts
    }

    /// The most recent glyph, if any.
    pub const fn last_glyph(&self) -> Option<&GlyphSpec> {
        self.last_glyph.as_ref()
    }

    /// Glyphs generated so far.
    pub const fn glyph_count(&self) -> u64 {
        self.glyph_count
    }

    /// Recorded before/after effect of speaking a signature.
    pub fn effect(&self, signature: &str) -> Option<&EffectDelta> {
        self.effects.get(signature)
    }

    fn observe(&self) -> Observables {
        compute_blended(
            &self.world,
            &self.params,
            self.driver.history_window,
            self.driver.history_weight,
        )
    }
}

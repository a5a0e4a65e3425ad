//! The frame loop.
//!
//! Frames are paced by a tokio interval at `frame_dt` and fed the measured
//! wall-clock delta; the session clamps it. Annotation runs on spawned
//! tasks and reports back over an mpsc channel, so the loop never waits on
//! the network. Results are applied in arrival order: final write wins,
//! and a result for an evicted entry is dropped.

use std::sync::Arc;
use std::time::Duration;

use glyphloop_annotator::{Annotator, AnnotatorError};
use glyphloop_core::session::{MacroTick, Session};
use glyphloop_types::Annotation;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Where auto-spoken glyphs land: the world center.
pub const AUTO_SPEAK_TARGET: (f64, f64) = (0.5, 0.5);

/// Annotation tasks allowed in flight at once.
pub const MAX_IN_FLIGHT: usize = 4;

const RESULT_CHANNEL_CAPACITY: usize = 16;

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames stepped.
    pub frames: u64,
    /// Glyphs generated.
    pub glyphs: u64,
    /// Glyphs spoken back into the world.
    pub spoken: u64,
    /// Annotation tasks started.
    pub requested: u64,
    /// Annotations written to the lexicon.
    pub applied: u64,
    /// Annotations that arrived after their entry was evicted.
    pub stale: u64,
    /// Annotation tasks that failed.
    pub failed: u64,
}

/// One finished annotation task.
#[derive(Debug)]
pub struct AnnotationOutcome {
    /// Lexicon key the request was made for.
    pub signature: String,
    /// What the annotator returned.
    pub result: Result<Annotation, AnnotatorError>,
}

/// Run `session` until `run_seconds` elapse, or until Ctrl-C when
/// `run_seconds` is 0.
pub async fn run(
    session: &mut Session,
    annotator: Option<Arc<Annotator>>,
) -> Result<RunSummary, EngineError> {
    let driver = session.driver().clone();
    let frame = to_duration("driver.frame_dt", driver.frame_dt)?;
    let run_for = if driver.run_seconds > 0.0 {
        Some(to_duration("driver.run_seconds", driver.run_seconds)?)
    } else {
        None
    };

    let mut ticker = interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let (tx, mut rx) = mpsc::channel::<AnnotationOutcome>(RESULT_CHANNEL_CAPACITY);

    let stop = async move {
        match run_for {
            Some(limit) => sleep(limit).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Ctrl-C handler unavailable, running until killed");
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    tokio::pin!(stop);

    info!(
        session_id = %session.id(),
        frame_dt = driver.frame_dt,
        run_seconds = driver.run_seconds,
        annotate = annotator.is_some(),
        "Frame loop started"
    );

    let mut summary = RunSummary::default();
    let mut in_flight = 0_usize;
    let mut last = Instant::now();

    loop {
        tokio::select! {
            () = &mut stop => break,
            now = ticker.tick() => {
                let wall_dt = now.saturating_duration_since(last).as_secs_f64();
                last = now;
                summary.frames += 1;
                if let Some(tick) = session.advance(wall_dt) {
                    on_macro_tick(session, &tick, &mut summary);
                    if let (Some(annotator), true) = (&annotator, tick.outcome.is_new()) {
                        if in_flight >= MAX_IN_FLIGHT {
                            debug!(signature = %tick.glyph.signature, in_flight, "Annotation skipped, too many in flight");
                        } else if spawn_annotation(session, &tick.glyph.signature, annotator, &tx) {
                            in_flight += 1;
                            summary.requested += 1;
                        }
                    }
                }
            }
            Some(outcome) = rx.recv() => {
                in_flight = in_flight.saturating_sub(1);
                apply_outcome(session, outcome, &mut summary);
            }
        }
    }

    if in_flight > 0 {
        info!(in_flight, "Abandoning unfinished annotations");
    }
    info!(
        frames = summary.frames,
        glyphs = summary.glyphs,
        spoken = summary.spoken,
        lexicon = session.lexicon().len(),
        "Frame loop stopped"
    );
    Ok(summary)
}

/// Count the glyph and auto-speak it when due.
pub fn on_macro_tick(session: &mut Session, tick: &MacroTick, summary: &mut RunSummary) {
    summary.glyphs += 1;
    let every = session.driver().auto_speak_every;
    if every > 0 && tick.index % every == 0 {
        let (x, y) = AUTO_SPEAK_TARGET;
        if session.speak(x, y).is_some() {
            summary.spoken += 1;
        }
    }
}

/// Apply one annotation result to the lexicon.
pub fn apply_outcome(session: &mut Session, outcome: AnnotationOutcome, summary: &mut RunSummary) {
    match outcome.result {
        Ok(annotation) => {
            if session.apply_annotation(&outcome.signature, annotation) {
                summary.applied += 1;
            } else {
                summary.stale += 1;
            }
        }
        Err(e) => {
            summary.failed += 1;
            warn!(
                signature = %outcome.signature,
                error = %e,
                "Annotation failed, lexicon unchanged"
            );
        }
    }
}

/// Start an annotation task for `signature`. Returns `false` when the entry
/// is already gone.
fn spawn_annotation(
    session: &Session,
    signature: &str,
    annotator: &Arc<Annotator>,
    tx: &mpsc::Sender<AnnotationOutcome>,
) -> bool {
    let Some(request) = session.annotation_request(signature) else {
        return false;
    };
    let annotator = Arc::clone(annotator);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = annotator.annotate(&request).await;
        let outcome = AnnotationOutcome {
            signature: request.entry.signature,
            result,
        };
        if tx.send(outcome).await.is_err() {
            debug!("Annotation result dropped, frame loop has stopped");
        }
    });
    true
}

fn to_duration(field: &'static str, seconds: f64) -> Result<Duration, EngineError> {
    Duration::try_from_secs_f64(seconds).map_err(|_overflow| EngineError::Duration { field, seconds })
}

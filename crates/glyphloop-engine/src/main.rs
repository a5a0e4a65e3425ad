//! Headless engine binary for Glyphloop.
//!
//! Wires the session driver to a real clock and, optionally, to the
//! annotator.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `glyphloop-config.yaml` (or `GLYPHLOOP_CONFIG`)
//! 3. Build the annotator when `auto_annotate` is on and its env is present
//! 4. Create the session
//! 5. Run the frame loop
//! 6. Log the summary and the most frequent lexicon entries

mod driver;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use glyphloop_annotator::{Annotator, AnnotatorError};
use glyphloop_core::config::GlyphloopConfig;
use glyphloop_core::session::Session;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file used when `GLYPHLOOP_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "glyphloop-config.yaml";

/// Lexicon entries listed in the closing report.
const REPORT_TOP_ENTRIES: usize = 5;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, annotator setup or the run loop
/// fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("glyphloop-engine starting");

    // 2. Load configuration.
    let config_path = std::env::var("GLYPHLOOP_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = GlyphloopConfig::load_or_default(&config_path)?;
    info!(
        path = %config_path.display(),
        preset = config.preset.as_deref().unwrap_or("none"),
        agent_count = config.session.agent_count,
        seed = config.session.seed,
        mode = config.session.mode.as_str(),
        macro_interval = config.driver.macro_interval,
        "Configuration loaded"
    );

    // 3. Annotator.
    let annotator = build_annotator(&config)?;

    // 4. Session.
    let mut session = Session::new(&config);

    // 5. Frame loop.
    let summary = driver::run(&mut session, annotator).await?;

    // 6. Report.
    info!(
        frames = summary.frames,
        glyphs = summary.glyphs,
        spoken = summary.spoken,
        annotations_requested = summary.requested,
        annotations_applied = summary.applied,
        annotations_stale = summary.stale,
        annotations_failed = summary.failed,
        lexicon = session.lexicon().len(),
        "Run complete"
    );
    let mut entries = session.lexicon().entries();
    entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    for entry in entries.iter().take(REPORT_TOP_ENTRIES) {
        info!(
            signature = %entry.signature,
            frequency = entry.frequency,
            operator = %entry.operator,
            tokens = %entry.tokens.join(" "),
            gloss = entry.annotation.as_ref().map_or("", |a| a.gloss.as_str()),
            "Lexicon entry"
        );
    }

    Ok(())
}

/// Build the annotator if annotation is enabled.
///
/// Missing `ANNOTATOR_*` variables disable annotation with a warning; any
/// other setup failure is fatal.
fn build_annotator(config: &GlyphloopConfig) -> Result<Option<Arc<Annotator>>, EngineError> {
    if !config.session.auto_annotate {
        return Ok(None);
    }
    match Annotator::from_env() {
        Ok(annotator) => {
            info!(
                backend = annotator.backend_name(),
                timeout_ms = u64::try_from(annotator.timeout().as_millis()).unwrap_or(u64::MAX),
                "Annotator ready"
            );
            Ok(Some(Arc::new(annotator)))
        }
        Err(AnnotatorError::Config(reason)) => {
            warn!(reason = %reason, "Annotator not configured, auto-annotate disabled");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

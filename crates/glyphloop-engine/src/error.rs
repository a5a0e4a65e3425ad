//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

use glyphloop_annotator::AnnotatorError;
use glyphloop_core::config::ConfigError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The annotator could not be built.
    #[error("annotator error: {source}")]
    Annotator {
        /// The underlying annotator error.
        #[from]
        source: AnnotatorError,
    },

    /// A configured duration cannot drive a timer.
    #[error("invalid duration for {field}: {seconds}")]
    Duration {
        /// Config field the value came from.
        field: &'static str,
        /// The rejected value in seconds.
        seconds: f64,
    },
}

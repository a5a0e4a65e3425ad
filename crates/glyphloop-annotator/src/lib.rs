//! Advisory annotator client for the Glyphloop lexicon.
//!
//! Sends one lexicon entry (plus recent observables, an optional speak
//! effect and any human labels) to a text-generation backend and validates
//! the reply into an [`Annotation`](glyphloop_types::Annotation). The
//! annotator is never authoritative: the driver applies whatever arrives
//! last, and a failed call leaves the lexicon untouched.
//!
//! # Modules
//!
//! - [`config`] -- backend selection and timeouts from environment variables
//! - [`error`] -- the [`AnnotatorError`] taxonomy
//! - [`llm`] -- HTTP client for the OpenAI-compatible and Anthropic dialects
//! - [`prompt`] -- `minijinja` prompt rendering
//! - [`parse`] -- response recovery and schema validation
//! - [`annotator`] -- bounded retry with a per-attempt timeout

pub mod annotator;
pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;

pub use annotator::{Annotator, MAX_ATTEMPTS, retry_with_timeout};
pub use config::{AnnotatorConfig, BackendType, LlmBackendConfig};
pub use error::AnnotatorError;

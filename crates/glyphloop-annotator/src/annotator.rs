//! Bounded retry around one annotation call.
//!
//! The prompt is rendered once. Each attempt then sends it, recovers the
//! JSON and validates it under a per-attempt deadline; a timed-out attempt
//! is aborted and counts toward the limit. After the last failed
//! attempt the caller gets [`AnnotatorError::Exhausted`] and nothing else
//! has changed.

use std::future::Future;
use std::time::Duration;

use glyphloop_types::{Annotation, AnnotationRequest};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AnnotatorConfig;
use crate::error::AnnotatorError;
use crate::llm::LlmBackend;
use crate::parse::parse_annotation;
use crate::prompt::PromptEngine;

/// Attempts per annotation, the first included.
pub const MAX_ATTEMPTS: u32 = 2;

/// Run `attempt` up to `attempts` times, aborting each try after
/// `per_attempt`.
///
/// `attempt` receives the 1-based attempt number.
pub async fn retry_with_timeout<T, F, Fut>(
    attempts: u32,
    per_attempt: Duration,
    mut attempt: F,
) -> Result<T, AnnotatorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AnnotatorError>>,
{
    let attempts = attempts.max(1);
    let timeout_ms = u64::try_from(per_attempt.as_millis()).unwrap_or(u64::MAX);
    let mut last_error = AnnotatorError::Timeout { timeout_ms };

    for number in 1..=attempts {
        let outcome = match timeout(per_attempt, attempt(number)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AnnotatorError::Timeout { timeout_ms }),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt = number, attempts, error = %e, "Annotation attempt failed");
                last_error = e;
            }
        }
    }

    Err(AnnotatorError::Exhausted {
        attempts,
        last_error: last_error.to_string(),
    })
}

/// A configured annotator: backend, prompts and deadline.
pub struct Annotator {
    backend: LlmBackend,
    prompts: PromptEngine,
    timeout: Duration,
}

impl Annotator {
    /// Build an annotator from configuration.
    pub fn new(config: &AnnotatorConfig) -> Result<Self, AnnotatorError> {
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
        Ok(Self {
            backend: LlmBackend::new(&config.backend),
            prompts,
            timeout: config.timeout,
        })
    }

    /// Build an annotator from `ANNOTATOR_*` environment variables.
    pub fn from_env() -> Result<Self, AnnotatorError> {
        Self::new(&AnnotatorConfig::from_env()?)
    }

    /// Name of the configured backend.
    pub const fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Per-attempt deadline.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request an annotation for one lexicon entry.
    ///
    /// Template errors are returned immediately; backend, timeout,
    /// malformed-body and validation failures are retried up to
    /// [`MAX_ATTEMPTS`] times in total.
    pub async fn annotate(&self, request: &AnnotationRequest) -> Result<Annotation, AnnotatorError> {
        let prompt = self.prompts.render(request)?;
        info!(
            request_id = %request.id,
            signature = %request.entry.signature,
            backend = self.backend.name(),
            "Annotation requested"
        );

        let prompt = &prompt;
        let annotation = retry_with_timeout(MAX_ATTEMPTS, self.timeout, |attempt| async move {
            debug!(request_id = %request.id, attempt, "Annotation attempt started");
            let raw = self.backend.complete(prompt).await?;
            parse_annotation(&raw)
        })
        .await?;

        info!(
            request_id = %request.id,
            signature = %request.entry.signature,
            gloss = %annotation.gloss,
            confidence = annotation.confidence,
            "Annotation received"
        );
        Ok(annotation)
    }
}

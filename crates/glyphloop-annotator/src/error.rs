//! Error types for the annotator client.
//!
//! Every failure class of a single attempt has its own variant so the retry
//! loop can log it; after the last attempt they collapse into
//! [`AnnotatorError::Exhausted`].

/// Errors that can occur while requesting an annotation.
#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// The backend was unreachable or the transport failed.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// An attempt exceeded its deadline and was aborted.
    #[error("timeout: annotation attempt exceeded {timeout_ms} ms")]
    Timeout {
        /// The per-attempt deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The backend answered with a non-success status.
    #[error("{backend} returned {status}: {body}")]
    Status {
        /// Backend name.
        backend: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// No JSON object could be recovered from the response text.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The recovered JSON does not match the annotation schema.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Every attempt failed.
    #[error("annotation failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Display form of the last attempt's error.
        last_error: String,
    },
}

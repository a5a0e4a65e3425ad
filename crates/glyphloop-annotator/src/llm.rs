//! HTTP client for the two chat dialects the annotator speaks.
//!
//! Both dialects take the same rendered prompt and answer with an
//! envelope holding one text reply. They differ in where the system
//! prompt goes, how the key is sent, and where the reply sits in the
//! envelope; [`BackendType`] decides each of those.

use serde_json::{Value, json};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::AnnotatorError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens. An annotation is a few short fields.
const MAX_TOKENS: u32 = 600;

/// Sampling temperature; glosses should be stable across retries.
const TEMPERATURE: f64 = 0.4;

/// Messages API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One configured chat endpoint.
pub struct LlmBackend {
    client: reqwest::Client,
    config: LlmBackendConfig,
}

impl LlmBackend {
    /// Wrap a backend configuration with a fresh HTTP client.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    /// Send a prompt and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotatorError::Backend`] when the transport fails,
    /// [`AnnotatorError::Status`] on a non-success status, and
    /// [`AnnotatorError::Malformed`] when the envelope has no text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, AnnotatorError> {
        let dialect = self.config.backend_type;
        let request = self
            .client
            .post(endpoint(&self.config))
            .json(&request_body(dialect, &self.config.model, prompt));
        let request = match dialect {
            BackendType::OpenAi => request.bearer_auth(&self.config.api_key),
            BackendType::Anthropic => request
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AnnotatorError::Backend(format!("{} request failed: {e}", self.name())))?;
        let envelope = read_success_body(response, self.name()).await?;
        reply_text(dialect, &envelope)
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        dialect_name(self.config.backend_type)
    }
}

const fn dialect_name(dialect: BackendType) -> &'static str {
    match dialect {
        BackendType::OpenAi => "openai-compatible",
        BackendType::Anthropic => "anthropic",
    }
}

fn endpoint(config: &LlmBackendConfig) -> String {
    let path = match config.backend_type {
        BackendType::OpenAi => "chat/completions",
        BackendType::Anthropic => "messages",
    };
    format!("{}/{path}", config.api_url)
}

/// Request body for one prompt. The OpenAI dialect carries the system
/// prompt as a message and asks for a JSON object reply; the Messages
/// dialect takes it as a top-level field.
fn request_body(dialect: BackendType, model: &str, prompt: &RenderedPrompt) -> Value {
    let user = json!({"role": "user", "content": prompt.user});
    match dialect {
        BackendType::OpenAi => json!({
            "model": model,
            "messages": [{"role": "system", "content": prompt.system}, user],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": {"type": "json_object"},
        }),
        BackendType::Anthropic => json!({
            "model": model,
            "system": prompt.system,
            "messages": [user],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        }),
    }
}

/// Pull the reply text out of a decoded envelope.
fn reply_text(dialect: BackendType, envelope: &Value) -> Result<String, AnnotatorError> {
    let pointer = match dialect {
        BackendType::OpenAi => "/choices/0/message/content",
        BackendType::Anthropic => "/content/0/text",
    };
    envelope
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AnnotatorError::Malformed(format!(
                "{} envelope has no text at {pointer}",
                dialect_name(dialect)
            ))
        })
}

/// Turn a non-success status into [`AnnotatorError::Status`], otherwise
/// decode the JSON envelope.
async fn read_success_body(
    response: reqwest::Response,
    backend: &'static str,
) -> Result<Value, AnnotatorError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(AnnotatorError::Status {
            backend,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| AnnotatorError::Malformed(format!("{backend} envelope is not JSON: {e}")))
}

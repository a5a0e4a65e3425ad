//! Configuration types for the annotator client.
//!
//! All configuration is loaded from environment variables: which backend
//! to call (URL, key, model), how long one attempt may take, and where to
//! find prompt template overrides.

use std::time::Duration;

use crate::error::AnnotatorError;

/// Default per-attempt deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 22_000;

/// Complete annotator configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// The backend to call.
    pub backend: LlmBackendConfig,
    /// Deadline for one attempt (HTTP call plus parsing).
    pub timeout: Duration,
    /// Directory holding `system.j2` and `user.j2` overrides. The built-in
    /// templates are used when unset.
    pub templates_dir: Option<String>,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

impl AnnotatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `ANNOTATOR_BACKEND` -- backend type (`openai`, `deepseek`, `ollama`, `anthropic`)
    /// - `ANNOTATOR_API_URL` -- API base URL
    /// - `ANNOTATOR_API_KEY` -- API key
    /// - `ANNOTATOR_MODEL` -- model name
    ///
    /// Optional variables:
    /// - `ANNOTATOR_TIMEOUT_MS` -- per-attempt deadline (default 22000)
    /// - `ANNOTATOR_TEMPLATES_DIR` -- prompt template overrides
    pub fn from_env() -> Result<Self, AnnotatorError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AnnotatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = load_backend_config(&lookup, "ANNOTATOR")?;

        let timeout_ms: u64 = match lookup("ANNOTATOR_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AnnotatorError::Config(format!("invalid ANNOTATOR_TIMEOUT_MS: {e}")))?,
            None => DEFAULT_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(AnnotatorError::Config(
                "ANNOTATOR_TIMEOUT_MS must be positive".to_owned(),
            ));
        }

        let templates_dir = lookup("ANNOTATOR_TEMPLATES_DIR").filter(|dir| !dir.trim().is_empty());

        Ok(Self {
            backend,
            timeout: Duration::from_millis(timeout_ms),
            templates_dir,
        })
    }
}

/// Read a required variable.
fn required<F>(lookup: &F, name: &str) -> Result<String, AnnotatorError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .ok_or_else(|| AnnotatorError::Config(format!("missing required env var {name}")))
}

/// Load a backend config from a set of prefixed variables.
fn load_backend_config<F>(lookup: &F, prefix: &str) -> Result<LlmBackendConfig, AnnotatorError>
where
    F: Fn(&str) -> Option<String>,
{
    let backend_str = required(lookup, &format!("{prefix}_BACKEND"))?;
    let api_url = required(lookup, &format!("{prefix}_API_URL"))?;
    let api_key = required(lookup, &format!("{prefix}_API_KEY"))?;
    let model = required(lookup, &format!("{prefix}_MODEL"))?;

    let backend_type = match backend_str.to_lowercase().as_str() {
        "openai" | "deepseek" | "ollama" => BackendType::OpenAi,
        "anthropic" | "claude" => BackendType::Anthropic,
        other => {
            return Err(AnnotatorError::Config(format!(
                "unknown backend type: {other}"
            )));
        }
    };

    Ok(LlmBackendConfig {
        backend_type,
        api_url: api_url.trim_end_matches('/').to_owned(),
        api_key,
        model,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        vars(&[
            ("ANNOTATOR_BACKEND", "openai"),
            ("ANNOTATOR_API_URL", "https://api.openai.com/v1/"),
            ("ANNOTATOR_API_KEY", "test-key"),
            ("ANNOTATOR_MODEL", "gpt-test"),
        ])
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let env = base();
        let config = AnnotatorConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::OpenAi);
        assert_eq!(config.backend.api_url, "https://api.openai.com/v1");
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn anthropic_aliases_and_overrides() {
        let mut env = base();
        env.insert("ANNOTATOR_BACKEND".to_owned(), "Claude".to_owned());
        env.insert("ANNOTATOR_TIMEOUT_MS".to_owned(), "20000".to_owned());
        env.insert("ANNOTATOR_TEMPLATES_DIR".to_owned(), "prompts".to_owned());
        let config = AnnotatorConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Anthropic);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.templates_dir.as_deref(), Some("prompts"));
    }

    #[test]
    fn missing_or_bad_values_are_config_errors() {
        let mut env = base();
        env.remove("ANNOTATOR_MODEL");
        let result = AnnotatorConfig::from_vars(|k| env.get(k).cloned());
        assert!(matches!(result, Err(AnnotatorError::Config(_))));

        let mut env = base();
        env.insert("ANNOTATOR_BACKEND".to_owned(), "carrier-pigeon".to_owned());
        let result = AnnotatorConfig::from_vars(|k| env.get(k).cloned());
        assert!(matches!(result, Err(AnnotatorError::Config(_))));

        let mut env = base();
        env.insert("ANNOTATOR_TIMEOUT_MS".to_owned(), "0".to_owned());
        let result = AnnotatorConfig::from_vars(|k| env.get(k).cloned());
        assert!(matches!(result, Err(AnnotatorError::Config(_))));
    }
}

//! Prompt template loading and rendering via `minijinja`.
//!
//! Two templates make up a prompt: `system.j2` describes the annotator's
//! role and the reply schema, `user.j2` renders one
//! [`AnnotationRequest`]. Built-in copies are compiled in; a templates
//! directory, when configured, replaces both so operators can tune the
//! wording without recompiling.

use glyphloop_types::AnnotationRequest;
use minijinja::Environment;

use crate::error::AnnotatorError;

const BUILTIN_SYSTEM: &str = include_str!("../templates/system.j2");
const BUILTIN_USER: &str = include_str!("../templates/user.j2");

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the task and reply schema.
    pub system: String,
    /// User message describing the glyph.
    pub user: String,
}

impl PromptEngine {
    /// Create a prompt engine from the built-in templates, or from
    /// `system.j2` and `user.j2` in `templates_dir` when given.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, AnnotatorError> {
        let (system_tpl, user_tpl) = match templates_dir {
            Some(dir) => (load_template(dir, "system.j2")?, load_template(dir, "user.j2")?),
            None => (BUILTIN_SYSTEM.to_owned(), BUILTIN_USER.to_owned()),
        };

        let mut env = Environment::new();
        env.add_template_owned("system", system_tpl)
            .map_err(|e| AnnotatorError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("user", user_tpl)
            .map_err(|e| AnnotatorError::Template(format!("failed to add user template: {e}")))?;

        Ok(Self { env })
    }

    /// Render the prompt for one annotation request.
    pub fn render(&self, request: &AnnotationRequest) -> Result<RenderedPrompt, AnnotatorError> {
        let context = serde_json::to_value(request)
            .map_err(|e| AnnotatorError::Template(format!("request serialization failed: {e}")))?;

        let system = self.render_one("system", &context)?;
        let user = self.render_one("user", &context)?;
        Ok(RenderedPrompt { system, user })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, AnnotatorError> {
        self.env
            .get_template(name)
            .map_err(|e| AnnotatorError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| AnnotatorError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, AnnotatorError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| AnnotatorError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use glyphloop_types::{
        AnnotationRequestId, EffectDelta, LexiconEntry, Observables, OperatorKind,
    };

    use super::*;

    fn request() -> AnnotationRequest {
        let now = Utc::now();
        let mut after = Observables::neutral();
        after.sync_index = 0.9;
        AnnotationRequest {
            id: AnnotationRequestId::new(),
            entry: LexiconEntry {
                signature: "1a2b3c4d".to_owned(),
                glyph_id: "g-1a2b3c4d-1000".to_owned(),
                tokens: vec!["RINGS_2".to_owned(), "TENSION_HIGH".to_owned()],
                operator: OperatorKind::Diverge,
                frequency: 3,
                first_seen: now,
                last_seen: now,
                observables: Observables::neutral(),
                annotation: None,
            },
            recent: vec![Observables::neutral(); 2],
            effect: Some(EffectDelta {
                before: Observables::neutral(),
                after,
            }),
            human_labels: vec!["storm".to_owned()],
        }
    }

    #[test]
    fn builtin_templates_render_the_request() {
        let engine = PromptEngine::new(None).unwrap();
        let prompt = engine.render(&request()).unwrap();

        assert!(prompt.system.contains("needs_verification"));
        assert!(prompt.user.contains("1a2b3c4d"));
        assert!(prompt.user.contains("RINGS_2 TENSION_HIGH"));
        assert!(prompt.user.contains("DIVERGE"));
        assert!(prompt.user.contains("Seen 3 times"));
        assert!(prompt.user.contains("sync_index: 0.5 -> 0.9"));
        assert!(prompt.user.contains("- storm"));
    }

    #[test]
    fn optional_sections_are_omitted() {
        let mut req = request();
        req.effect = None;
        req.human_labels.clear();
        req.recent.clear();
        let engine = PromptEngine::new(None).unwrap();
        let user = engine.render(&req).unwrap().user;
        assert!(!user.contains("Effect of the last time"));
        assert!(!user.contains("Labels from human observers"));
        assert!(!user.contains("Recent trend"));
    }

    #[test]
    fn directory_templates_override_builtins() {
        let dir = std::env::temp_dir().join(format!("glyphloop-prompt-{}", AnnotationRequestId::new()));
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "Annotate.").ok();
        std::fs::write(dir.join("user.j2"), "{{ entry.signature }}/{{ entry.frequency }}").ok();

        let engine = PromptEngine::new(dir.to_str()).unwrap();
        let prompt = engine.render(&request()).unwrap();
        assert_eq!(prompt.system, "Annotate.");
        assert_eq!(prompt.user, "1a2b3c4d/3");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_a_template_error() {
        let result = PromptEngine::new(Some("/nonexistent/glyphloop/templates"));
        assert!(matches!(result, Err(AnnotatorError::Template(_))));
    }
}

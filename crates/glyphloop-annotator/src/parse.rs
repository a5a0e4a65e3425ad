//! Response recovery and schema validation.
//!
//! Models wrap JSON in prose, code fences or trailing commas. Recovery
//! tries progressively more aggressive strategies and yields `None` when
//! none of them produce a JSON object:
//!
//! 1. Direct parse of the trimmed text
//! 2. Extract from a fenced code block
//! 3. Strip trailing commas
//! 4. Code block plus trailing-comma strip
//! 5. The outermost `{ ... }` span
//!
//! Validation is strict: every annotation field must be present with the
//! right type and `confidence` must lie in `[0, 1]`.

use glyphloop_types::Annotation;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AnnotatorError;

/// Recover and validate an annotation from raw response text.
///
/// # Errors
///
/// [`AnnotatorError::Malformed`] when no JSON object can be recovered,
/// [`AnnotatorError::Validation`] when the object breaks the schema.
pub fn parse_annotation(raw: &str) -> Result<Annotation, AnnotatorError> {
    let value = recover_json(raw).ok_or_else(|| {
        AnnotatorError::Malformed(format!(
            "no JSON object in response ({} chars)",
            raw.chars().count()
        ))
    })?;
    validate_annotation(&value)
}

/// Try each recovery strategy in turn.
pub fn recover_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    if let Some(value) = parse_object(trimmed) {
        return Some(value);
    }

    let block = extract_json_from_codeblock(trimmed);
    if let Some(value) = block.and_then(parse_object) {
        debug!("Recovered annotation JSON from code block");
        return Some(value);
    }

    if let Some(value) = parse_object(&strip_trailing_commas(trimmed)) {
        debug!("Recovered annotation JSON after stripping trailing commas");
        return Some(value);
    }

    if let Some(value) = block.and_then(|b| parse_object(&strip_trailing_commas(b))) {
        debug!("Recovered annotation JSON from code block after stripping trailing commas");
        return Some(value);
    }

    let span = outermost_braces(trimmed)?;
    let value = parse_object(span).or_else(|| parse_object(&strip_trailing_commas(span)))?;
    debug!("Recovered annotation JSON from embedded object");
    Some(value)
}

/// Check a recovered object against the annotation schema.
pub fn validate_annotation(value: &Value) -> Result<Annotation, AnnotatorError> {
    let object = value
        .as_object()
        .ok_or_else(|| AnnotatorError::Validation("response is not a JSON object".to_owned()))?;

    let gloss = string_field(object, "gloss")?;
    if gloss.trim().is_empty() {
        return Err(AnnotatorError::Validation("gloss is empty".to_owned()));
    }

    let confidence = object
        .get("confidence")
        .ok_or_else(|| missing("confidence"))?
        .as_f64()
        .ok_or_else(|| mistyped("confidence", "a number"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(AnnotatorError::Validation(format!(
            "confidence {confidence} is outside [0, 1]"
        )));
    }

    let needs_verification = object
        .get("needs_verification")
        .ok_or_else(|| missing("needs_verification"))?
        .as_bool()
        .ok_or_else(|| mistyped("needs_verification", "a boolean"))?;

    Ok(Annotation {
        gloss: gloss.trim().to_owned(),
        definition: string_field(object, "definition")?.to_owned(),
        usage: string_field(object, "usage")?.to_owned(),
        contrasts: string_list(object, "contrasts")?,
        tags: string_list(object, "tags")?,
        confidence,
        needs_verification,
        rationale: string_field(object, "rationale")?.to_owned(),
    })
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn missing(field: &str) -> AnnotatorError {
    AnnotatorError::Validation(format!("missing required field `{field}`"))
}

fn mistyped(field: &str, expected: &str) -> AnnotatorError {
    AnnotatorError::Validation(format!("field `{field}` must be {expected}"))
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, AnnotatorError> {
    object
        .get(field)
        .ok_or_else(|| missing(field))?
        .as_str()
        .ok_or_else(|| mistyped(field, "a string"))
}

fn string_list(object: &Map<String, Value>, field: &str) -> Result<Vec<String>, AnnotatorError> {
    object
        .get(field)
        .ok_or_else(|| missing(field))?
        .as_array()
        .ok_or_else(|| mistyped(field, "an array of strings"))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(ToOwned::to_owned)
                .ok_or_else(|| mistyped(field, "an array of strings"))
        })
        .collect()
}

/// Extract the body of the first fenced code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open + 3..)?;
    // Skip the language tag line, if any.
    let body_start = after_fence.find('\n').map_or(0, |nl| nl + 1);
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets.
///
/// Commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars
                .get(i + 1..)
                .and_then(|rest| rest.iter().find(|ch| !ch.is_whitespace()));
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}

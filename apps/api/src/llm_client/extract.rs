//! JSON extraction from free-form model output.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid JSON response from API")]
    InvalidJson,

    #[error("Failed to process API response")]
    Unprocessable,
}

/// Pulls a JSON object out of model output.
///
/// Tolerates a fenced code block (```` ```json ... ``` ````) anywhere in the
/// text and any prose before or after the object: the fenced body is taken
/// first, then the span from the first `{` to the last `}`.
pub fn extract_json(raw_text: &str) -> Result<Map<String, Value>, ExtractError> {
    if raw_text.trim().is_empty() {
        return Err(ExtractError::Unprocessable);
    }

    let body = fenced_body(raw_text)
        .filter(|b| b.contains('{'))
        .unwrap_or_else(|| raw_text.to_string());
    let candidate = object_span(&body).unwrap_or(body.as_str());

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ExtractError::InvalidJson),
    }
}

/// Lines between the first opening fence and its closing fence.
/// An unterminated fence runs to the end of the text.
fn fenced_body(text: &str) -> Option<String> {
    let mut lines = text.lines();
    lines.find(|l| l.trim_start().starts_with("```"))?;

    let body: Vec<&str> = lines
        .take_while(|l| !l.trim_start().starts_with("```"))
        .collect();
    Some(body.join("\n"))
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

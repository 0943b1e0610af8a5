// Assessment: the four LLM-backed operations of an interview.
// Each one is template -> LlmClient::request -> typed result or fixed fallback.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod compare;
pub mod handlers;
pub mod multiple;
pub mod prompts;
pub mod questions;
pub mod single;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::StructuredResult;

/// Provider scores are passed through as received. Implementors only report
/// values that look wrong so callers can flag them.
pub trait ScoreAudit {
    fn score_anomalies(&self) -> Vec<String>;
}

pub(crate) fn check_range(label: &str, value: f64, max: f64, anomalies: &mut Vec<String>) {
    if !(0.0..=max).contains(&value) {
        anomalies.push(format!("{label} is {value}, outside 0-{max}"));
    }
}

pub(crate) fn check_sum(label: &str, parts: &[f64], overall: f64, anomalies: &mut Vec<String>) {
    let sum: f64 = parts.iter().sum();
    if (sum - overall).abs() > 0.5 {
        anomalies.push(format!(
            "{label} sum to {sum} but overall_score is {overall}"
        ));
    }
}

pub(crate) fn log_anomalies<T: ScoreAudit>(purpose: &str, result: &StructuredResult<T>) {
    if let StructuredResult::Ok(value) = result {
        for anomaly in value.score_anomalies() {
            warn!("{purpose}: provider score left as-is: {anomaly}");
        }
    }
}

/// Reads an enumerated label that is not part of the expected shape. An
/// unrecognised label becomes `T::default()` so the rest of the payload is kept.
pub(crate) fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw.clone()).unwrap_or_else(|_| {
        warn!("Unrecognised label {raw} in provider payload, using the default");
        T::default()
    }))
}

/// Substitutes `{key}` placeholders in one pass, so replacement text that
/// happens to contain a placeholder is left alone. Unknown placeholders and
/// literal braces are kept.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find_map(|(key, value)| {
            tail.strip_prefix(key)?
                .strip_prefix('}')
                .map(|after| (*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Live,
    Fallback,
}

/// Envelope returned by every assessment endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse<T> {
    pub source: ResultSource,
    /// Set when live AI feedback was unavailable.
    pub warning: Option<String>,
    pub score_warnings: Vec<String>,
    pub result: T,
}

impl<T: ScoreAudit> AssessmentResponse<T> {
    pub fn from_result(result: StructuredResult<T>) -> Result<Self, AppError> {
        match result {
            StructuredResult::Ok(value) => Ok(Self {
                source: ResultSource::Live,
                warning: None,
                score_warnings: value.score_anomalies(),
                result: value,
            }),
            StructuredResult::Fallback { value, reason } => Ok(Self {
                source: ResultSource::Fallback,
                warning: Some(format!(
                    "Live AI feedback is unavailable ({reason}); showing a generic result."
                )),
                score_warnings: Vec::new(),
                result: value,
            }),
            StructuredResult::Error(reason) => Err(AppError::Llm(reason.to_string())),
        }
    }
}

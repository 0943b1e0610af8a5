/// LLM Client — the single point of entry for all model calls in Talent Scout.
///
/// ARCHITECTURAL RULE: No other module may talk to the provider directly.
/// Every prompt goes through `LlmClient`, which owns retry/backoff, rate-limit
/// cooldowns, JSON extraction, shape validation and the fallback payloads.
/// Callers never see a provider error: they get `StructuredResult`.
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use rand::Rng;

pub mod extract;
pub mod prompts;
pub mod provider;
pub mod retry;
#[cfg(test)]
pub mod testing;

use self::extract::extract_json;
use self::provider::{select_model, Generation, LlmError, TextGenerator};
use self::retry::RetryPolicy;

/// Prompt used by the connection check.
const PING_PROMPT: &str = "Say 'API is working'";

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

/// Why a call could not produce a live result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No model was selected at startup.
    Unconfigured,
    /// Network or service errors on every attempt.
    Transient,
    /// The provider kept signalling rate limits or quota exhaustion.
    RateLimited,
    /// The model answered, but not with the expected JSON object.
    Malformed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            FailureKind::Unconfigured => "LLM is not configured",
            FailureKind::Transient => "LLM service unavailable after retries",
            FailureKind::RateLimited => "LLM rate limit exceeded",
            FailureKind::Malformed => "LLM returned a malformed response",
        };
        f.write_str(message)
    }
}

/// Outcome of a gateway call.
///
/// The untyped `request_structured_output` yields `Ok` or `Error`; typed
/// requests through `request` replace `Error` with the purpose's fallback,
/// so derived operations only ever yield `Ok` or `Fallback`.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult<T> {
    Ok(T),
    Fallback { value: T, reason: FailureKind },
    Error(FailureKind),
}

impl<T> StructuredResult<T> {
    #[cfg(test)]
    pub fn value(&self) -> Option<&T> {
        match self {
            StructuredResult::Ok(value) | StructuredResult::Fallback { value, .. } => Some(value),
            StructuredResult::Error(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            StructuredResult::Ok(value) | StructuredResult::Fallback { value, .. } => Some(value),
            StructuredResult::Error(_) => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StructuredResult::Ok(_))
    }

    #[cfg(test)]
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            StructuredResult::Ok(_) => None,
            StructuredResult::Fallback { reason, .. } | StructuredResult::Error(reason) => {
                Some(*reason)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shape validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeMode {
    AnyOf,
    AllOf,
}

/// Top-level keys a payload must carry before it is trusted. Only presence is
/// checked here; types are checked when the payload is deserialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedShape {
    pub keys: Vec<String>,
    pub mode: ShapeMode,
}

impl ExpectedShape {
    pub fn any_of<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            mode: ShapeMode::AnyOf,
        }
    }

    pub fn all_of<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            mode: ShapeMode::AllOf,
        }
    }

    /// Accepts any object.
    #[cfg(test)]
    pub fn object() -> Self {
        Self::all_of(Vec::<String>::new())
    }

    pub fn matches(&self, payload: &Map<String, Value>) -> bool {
        if payload.contains_key("error") && !self.keys.iter().any(|k| k == "error") {
            return false;
        }
        match self.mode {
            ShapeMode::AnyOf if self.keys.is_empty() => true,
            ShapeMode::AnyOf => self.keys.iter().any(|k| payload.contains_key(k)),
            ShapeMode::AllOf => self.keys.iter().all(|k| payload.contains_key(k)),
        }
    }
}

/// A purpose-specific payload the gateway can request, validate and replace
/// with a deterministic default.
pub trait StructuredOutput: DeserializeOwned + Sized {
    /// Short name used in logs.
    const PURPOSE: &'static str;

    fn expected_shape() -> ExpectedShape;

    fn fallback() -> Self;

    fn from_payload(payload: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(payload))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingReport {
    pub ok: bool,
    pub model: Option<String>,
    pub reason: Option<FailureKind>,
}

/// The single LLM client used by all services in Talent Scout.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn TextGenerator>,
    model: Option<String>,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn TextGenerator>, model: Option<String>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            model,
            policy,
        }
    }

    /// Lists the provider's models and selects the first preferred one.
    ///
    /// Returns `Err` when the listing succeeds but offers none of the preferred
    /// models. When the listing itself fails the client starts degraded: no
    /// model, every call returns its fallback.
    pub async fn connect(
        provider: Arc<dyn TextGenerator>,
        preferred: &[String],
        policy: RetryPolicy,
    ) -> Result<Self, LlmError> {
        let model = match provider.list_models().await {
            Ok(available) => {
                debug!("Available models: {available:?}");
                let model = select_model(&available, preferred)?;
                info!("Using model {model}");
                Some(model)
            }
            Err(e) => {
                error!("Could not list models, LLM features will use fallbacks: {e}");
                None
            }
        };
        Ok(Self::new(provider, model, policy))
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls the provider with retry.
    ///
    /// Attempt `i ≥ 1` is preceded by `2^i` seconds plus up to one second of
    /// jitter, or by the rate-limit cooldown when the previous attempt was
    /// rate limited. Every error counts toward `max_attempts`.
    async fn generate_with_retry(&self, prompt: &str) -> Result<Generation, FailureKind> {
        let model = self.model.as_deref().ok_or(FailureKind::Unconfigured)?;

        let mut cooldown = None;
        let mut last_failure = FailureKind::Transient;

        for attempt in 0..self.policy.max_attempts {
            let delay = match cooldown.take() {
                Some(delay) => delay,
                None => {
                    let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
                    self.policy.backoff_delay(attempt, jitter)
                }
            };
            if !delay.is_zero() {
                warn!(
                    "LLM call attempt {} failed, retrying after {:.1}s...",
                    attempt,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let e = match self.provider.generate(model, prompt).await {
                Ok(generation) => return Ok(generation),
                Err(e) => e,
            };

            warn!(
                "LLM attempt {}/{} failed: {e}",
                attempt + 1,
                self.policy.max_attempts
            );

            if e.is_rate_limited() {
                last_failure = FailureKind::RateLimited;
                cooldown = Some(self.policy.rate_limit_cooldown(e.retry_hint()));
            } else {
                last_failure = FailureKind::Transient;
            }
        }

        Err(last_failure)
    }

    /// Sends `prompt` and returns the JSON object found in the reply, provided
    /// it carries the keys described by `shape`.
    pub async fn request_structured_output(
        &self,
        prompt: &str,
        shape: &ExpectedShape,
    ) -> StructuredResult<Map<String, Value>> {
        let generation = match self.generate_with_retry(prompt).await {
            Ok(generation) => generation,
            Err(kind) => return StructuredResult::Error(kind),
        };

        match extract_json(&generation.text) {
            Ok(payload) if shape.matches(&payload) => StructuredResult::Ok(payload),
            Ok(payload) => {
                warn!(
                    "LLM payload is missing expected keys {:?}: got {:?}",
                    shape.keys,
                    payload.keys().collect::<Vec<_>>()
                );
                StructuredResult::Error(FailureKind::Malformed)
            }
            Err(e) => {
                warn!(
                    "{e}. Raw response: {:?}",
                    generation.text.chars().take(200).collect::<String>()
                );
                StructuredResult::Error(FailureKind::Malformed)
            }
        }
    }

    /// Typed request: validated payload, or `T::fallback()` with the reason.
    pub async fn request<T: StructuredOutput>(&self, prompt: &str) -> StructuredResult<T> {
        let reason = match self
            .request_structured_output(prompt, &T::expected_shape())
            .await
        {
            StructuredResult::Ok(payload) => match T::from_payload(payload) {
                Ok(value) => return StructuredResult::Ok(value),
                Err(e) => {
                    warn!("{} payload failed validation: {e}", T::PURPOSE);
                    FailureKind::Malformed
                }
            },
            StructuredResult::Fallback { reason, .. } | StructuredResult::Error(reason) => reason,
        };

        warn!("{} falling back to default payload: {reason}", T::PURPOSE);
        StructuredResult::Fallback {
            value: T::fallback(),
            reason,
        }
    }

    /// Round-trips a trivial prompt through the retry loop.
    pub async fn ping(&self) -> PingReport {
        let result = self.generate_with_retry(PING_PROMPT).await;
        PingReport {
            ok: result.is_ok(),
            model: self.model.clone(),
            reason: result.err(),
        }
    }
}

//! Text-generation provider boundary.
//!
//! The gateway only needs two capabilities from a provider: turn a prompt into
//! text, and list the model identifiers it serves. `GeminiProvider` is the
//! production implementation; anything else with the same shape can be
//! swapped in through `Arc<dyn TextGenerator>`.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order when none is configured. Flash first for its looser rate limits.
pub const DEFAULT_PREFERRED_MODELS: &[&str] = &[
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
    "models/gemini-1.5-pro-latest",
];

const REQUEST_TIMEOUT_SECS: u64 = 120;

const RATE_LIMIT_MARKERS: &[&str] = &["429", "quota", "rate limit", "resource_exhausted"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No preferred model is available (wanted one of: {wanted})")]
    NoPreferredModel { wanted: String },
}

impl LlmError {
    /// True when the provider signalled a rate limit or exhausted quota.
    pub fn is_rate_limited(&self) -> bool {
        if let LlmError::Api { status: 429, .. } = self {
            return true;
        }
        let text = self.to_string().to_lowercase();
        RATE_LIMIT_MARKERS.iter().any(|m| text.contains(m))
    }

    /// Cooldown suggested by the provider inside the error text, if any.
    pub fn retry_hint(&self) -> Option<Duration> {
        parse_retry_hint(&self.to_string())
    }
}

/// Extracts a retry delay from provider error text.
///
/// Understands the gRPC style `retry_delay { seconds: 37 }` and the REST
/// style `"retryDelay": "37s"` (fractional seconds are truncated).
pub fn parse_retry_hint(text: &str) -> Option<Duration> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r#"seconds:\s*(\d+)|"retryDelay"\s*:\s*"(\d+)(?:\.\d+)?s""#).ok())
        .as_ref()?;

    let captures = pattern.captures(text)?;
    let secs = captures
        .get(1)
        .or_else(|| captures.get(2))?
        .as_str()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(secs))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw text produced by the provider for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
}

impl Generation {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, LlmError>;

    async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

/// Picks the first preferred model the provider actually serves.
pub fn select_model(available: &[String], preferred: &[String]) -> Result<String, LlmError> {
    preferred
        .iter()
        .find(|p| available.iter().any(|a| a == *p))
        .cloned()
        .ok_or_else(|| LlmError::NoPreferredModel {
            wanted: preferred.join(", "),
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Google Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn error_from(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        LlmError::Api { status, message }
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, LlmError> {
        let url = format!("{}/v1beta/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.text().await?)?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        let usage = parsed
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        debug!(
            "Gemini call succeeded: model={model}, input_tokens={}, output_tokens={}",
            usage.input_tokens, usage.output_tokens
        );

        Ok(Generation { text, usage })
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .query(&[("pageSize", "1000")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let list: ModelList = serde_json::from_str(&response.text().await?)?;
        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods.is_empty()
                    || m
                        .supported_generation_methods
                        .iter()
                        .any(|g| g == "generateContent")
            })
            .map(|m| m.name)
            .collect())
    }
}

use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::provider::{DEFAULT_GEMINI_API_BASE, DEFAULT_PREFERRED_MODELS};
use crate::llm_client::retry::DEFAULT_RATE_LIMIT_DELAY;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_api_base: String,
    /// Model identifiers in order of preference.
    pub preferred_models: Vec<String>,
    pub rate_limit_delay: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let rate_limit_delay = match std::env::var("LLM_RATE_LIMIT_DELAY_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse::<u64>()
                    .context("LLM_RATE_LIMIT_DELAY_SECS must be a whole number of seconds")?,
            ),
            Err(_) => DEFAULT_RATE_LIMIT_DELAY,
        };

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string()),
            preferred_models: std::env::var("GEMINI_MODELS")
                .map(|v| parse_model_list(&v))
                .ok()
                .filter(|models| !models.is_empty())
                .unwrap_or_else(|| {
                    DEFAULT_PREFERRED_MODELS
                        .iter()
                        .map(|m| m.to_string())
                        .collect()
                }),
            rate_limit_delay,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Splits a comma separated model list; bare names get the `models/` prefix.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            if m.starts_with("models/") {
                m.to_string()
            } else {
                format!("models/{m}")
            }
        })
        .collect()
}

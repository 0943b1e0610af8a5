//! Test providers: scripted replies, a provider that never answers, and one client per failure kind.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::provider::{Generation, LlmError, TextGenerator};
use super::retry::{RetryPolicy, MAX_ATTEMPTS};
use super::{FailureKind, LlmClient};

/// Replays queued results in order; once the script runs out every call
/// fails with a 503.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Generation, LlmError>>>,
    models: Option<Vec<String>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<Generation, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            models: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    /// Replies to every call with the same text.
    pub fn replying(text: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(Generation::text(text))).collect())
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<Generation, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::Api {
                    status: 503,
                    message: "scripted outage".to_string(),
                })
            })
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        self.models.clone().ok_or(LlmError::Api {
            status: 503,
            message: "scripted outage".to_string(),
        })
    }
}

/// Never answers a generation request, like a provider stuck behind a long
/// cooldown or timeout.
pub struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<Generation, LlmError> {
        std::future::pending::<Result<Generation, LlmError>>().await
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        Ok(vec!["models/m".to_string()])
    }
}

/// One client per failure a derived operation has to absorb, paired with
/// the reason its fallback should report.
pub fn failure_matrix() -> Vec<(LlmClient, FailureKind)> {
    let quota_errors = (0..MAX_ATTEMPTS)
        .map(|_| {
            Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted (e.g. check quota).".to_string(),
            })
        })
        .collect();

    [
        (ScriptedGenerator::always_failing(), Some("models/m"), FailureKind::Transient),
        (ScriptedGenerator::new(quota_errors), Some("models/m"), FailureKind::RateLimited),
        (
            ScriptedGenerator::replying("I would rate this answer highly.", 1),
            Some("models/m"),
            FailureKind::Malformed,
        ),
        (ScriptedGenerator::always_failing(), None, FailureKind::Unconfigured),
    ]
    .into_iter()
    .map(|(generator, model, kind)| {
        let client = LlmClient::new(
            Arc::new(generator),
            model.map(str::to_string),
            RetryPolicy::default(),
        );
        (client, kind)
    })
    .collect()
}

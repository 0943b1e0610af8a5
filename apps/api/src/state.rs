use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// In-memory interview sessions. Nothing is persisted.
    pub sessions: SessionStore,
    pub config: Config,
}

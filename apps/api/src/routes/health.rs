use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and whether the LLM gateway has a model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let llm = if state.llm.is_degraded() { "degraded" } else { "ok" };
    let sessions = state.sessions.len().await;

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "talent-scout",
        "llm": llm,
        "model": state.llm.model(),
        "preferred_models": state.config.preferred_models,
        "sessions": sessions
    }))
}

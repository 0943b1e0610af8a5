//! Axum route handlers for stand-alone assessments and the LLM connection check.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::assessment::compare::{compare_answers, AnswerComparison};
use crate::assessment::AssessmentResponse;
use crate::errors::AppError;
use crate::llm_client::PingReport;
use crate::state::AppState;

const DEFAULT_COMPARISON_CONTEXT: &str = "General position";

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub question: String,
    pub answer_a: String,
    pub answer_b: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// POST /api/v1/assessments/compare
pub async fn handle_compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<AssessmentResponse<AnswerComparison>>, AppError> {
    for (name, value) in [
        ("question", &request.question),
        ("answer_a", &request.answer_a),
        ("answer_b", &request.answer_b),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} cannot be empty")));
        }
    }
    let context = request
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COMPARISON_CONTEXT);

    let result = compare_answers(
        &state.llm,
        &request.question,
        &request.answer_a,
        &request.answer_b,
        context,
    )
    .await;
    Ok(Json(AssessmentResponse::from_result(result)?))
}

/// POST /api/v1/llm/ping
///
/// Always 200; `ok` tells whether the provider answered.
pub async fn handle_ping(State(state): State<AppState>) -> Json<PingReport> {
    Json(state.llm.ping().await)
}

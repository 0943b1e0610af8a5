pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers as assessment;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/llm/ping", post(assessment::handle_ping))
        // Interview API
        .route("/api/v1/interviews", post(interview::handle_create_interview))
        .route(
            "/api/v1/interviews/:id",
            get(interview::handle_get_interview).delete(interview::handle_delete_interview),
        )
        .route(
            "/api/v1/interviews/:id/profile",
            post(interview::handle_profile_answer),
        )
        .route(
            "/api/v1/interviews/:id/questions",
            post(interview::handle_generate_questions),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            post(interview::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/answers/:n/evaluation",
            post(interview::handle_evaluate_answer),
        )
        .route(
            "/api/v1/interviews/:id/evaluation",
            post(interview::handle_final_evaluation),
        )
        // Assessment API
        .route("/api/v1/assessments/compare", post(assessment::handle_compare))
        .with_state(state)
}

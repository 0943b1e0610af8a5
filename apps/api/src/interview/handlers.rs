//! Axum route handlers for the Interview API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assessment::multiple::{evaluate_multiple_answers, MultiEvaluation};
use crate::assessment::questions::generate_questions;
use crate::assessment::single::{evaluate_single_answer, SingleEvaluation};
use crate::assessment::AssessmentResponse;
use crate::errors::AppError;
use crate::interview::session::{InterviewSession, NextPrompt, Progress, Stage};
use crate::models::profile::CandidateProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileAnswerRequest {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
    /// Evaluate this answer immediately instead of waiting for the end.
    #[serde(default)]
    pub instant_feedback: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: InterviewSession,
    pub progress: Progress,
    pub next_prompt: Option<NextPrompt>,
}

impl From<InterviewSession> for SessionView {
    fn from(session: InterviewSession) -> Self {
        Self {
            progress: session.progress(),
            next_prompt: session.next_prompt(),
            session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub question_number: usize,
    pub feedback: Option<AssessmentResponse<SingleEvaluation>>,
    pub interview: SessionView,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    info!("Interview {} started", session.id);
    (StatusCode::CREATED, Json(session.into()))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(id).await?.into()))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    info!("Interview {id} discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/interviews/:id/profile
///
/// Answers the current profile question. The last answer triggers question
/// generation; the response then carries the first technical question.
/// While questions are still missing, the call reruns generation instead.
pub async fn handle_profile_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProfileAnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let completed = state
        .sessions
        .update(id, |s| {
            if s.stage == Stage::AwaitingQuestions {
                return s.profile_awaiting_questions().map(Some);
            }
            s.submit_profile_answer(&request.answer)
        })
        .await?;

    if let Some(profile) = completed {
        install_generated_questions(&state, id, &profile).await?;
    }

    Ok(Json(state.sessions.get(id).await?.into()))
}

/// POST /api/v1/interviews/:id/questions
///
/// Reruns question generation for a completed profile whose questions were
/// never installed, e.g. because the original request was dropped.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let profile = state
        .sessions
        .update(id, |s| s.profile_awaiting_questions())
        .await?;
    install_generated_questions(&state, id, &profile).await?;

    Ok(Json(state.sessions.get(id).await?.into()))
}

async fn install_generated_questions(
    state: &AppState,
    id: Uuid,
    profile: &CandidateProfile,
) -> Result<(), AppError> {
    info!("Interview {id}: profile complete, generating questions");
    let result = generate_questions(&state.llm, profile).await;
    state
        .sessions
        .update(id, |s| {
            // A concurrent rerun may have installed its questions first.
            if s.stage != Stage::AwaitingQuestions {
                return Ok(());
            }
            s.install_questions(result)
        })
        .await
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let (question_number, pair, context) = state
        .sessions
        .update(id, |s| {
            let (number, pair) = s.submit_answer(&request.answer)?;
            Ok((number, pair, s.single_context()))
        })
        .await?;

    let feedback = if request.instant_feedback {
        let result =
            evaluate_single_answer(&state.llm, &pair.question, &pair.answer, &context).await;
        let envelope = AssessmentResponse::from_result(result)?;
        state
            .sessions
            .update(id, |s| {
                s.record_instant_evaluation(question_number, envelope.clone());
                Ok(())
            })
            .await?;
        Some(envelope)
    } else {
        None
    };

    Ok(Json(AnswerResponse {
        question_number,
        feedback,
        interview: state.sessions.get(id).await?.into(),
    }))
}

/// POST /api/v1/interviews/:id/answers/:n/evaluation
///
/// Evaluates answer `n` (1-based). A stored evaluation is returned as-is.
pub async fn handle_evaluate_answer(
    State(state): State<AppState>,
    Path((id, number)): Path<(Uuid, usize)>,
) -> Result<Json<AssessmentResponse<SingleEvaluation>>, AppError> {
    let session = state.sessions.get(id).await?;
    if let Some(existing) = session.instant_evaluations.get(&number) {
        return Ok(Json(existing.clone()));
    }
    let pair = session.answer(number)?.clone();

    let result = evaluate_single_answer(
        &state.llm,
        &pair.question,
        &pair.answer,
        &session.single_context(),
    )
    .await;
    let envelope = AssessmentResponse::from_result(result)?;

    state
        .sessions
        .update(id, |s| {
            s.record_instant_evaluation(number, envelope.clone());
            Ok(())
        })
        .await?;
    Ok(Json(envelope))
}

/// POST /api/v1/interviews/:id/evaluation
///
/// Scores every answer together once the last question has been answered.
/// Repeating the call returns the stored result.
pub async fn handle_final_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentResponse<MultiEvaluation>>, AppError> {
    let session = state.sessions.get(id).await?;
    if let Some(existing) = &session.final_evaluation {
        return Ok(Json(existing.clone()));
    }
    let pairs = session.pairs_for_final_evaluation()?;

    info!("Interview {id}: evaluating {} answers", pairs.len());
    let result =
        evaluate_multiple_answers(&state.llm, &pairs, &session.interview_context()).await;
    let envelope = AssessmentResponse::from_result(result)?;

    state
        .sessions
        .update(id, |s| {
            s.record_final_evaluation(envelope.clone());
            Ok(())
        })
        .await?;
    Ok(Json(envelope))
}

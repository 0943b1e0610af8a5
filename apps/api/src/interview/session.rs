//! One candidate's interview: profile wizard, technical questions, answers and results.
//!
//! `InterviewSession` is the whole per-interview context. Handlers fetch it
//! from the `SessionStore`, mutate it through the methods below and never
//! hold it across an LLM call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::assessment::multiple::MultiEvaluation;
use crate::assessment::questions::{QuestionSet, QUESTION_COUNT};
use crate::assessment::single::SingleEvaluation;
use crate::assessment::{AssessmentResponse, ResultSource};
use crate::errors::AppError;
use crate::llm_client::StructuredResult;
use crate::models::profile::{CandidateProfile, ProfileField};
use crate::models::qa::QaPair;

pub const TOTAL_STEPS: usize = ProfileField::ALL.len() + QUESTION_COUNT as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Stage {
    /// Collecting profile field `step` (0-based).
    Profile { step: usize },
    /// Profile complete; questions not installed yet.
    AwaitingQuestions,
    /// Waiting for the answer to technical question `index` (0-based).
    Technical { index: usize },
    /// Every question answered; final evaluation not yet run.
    Answered,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    Candidate,
}

/// One line of the running conversation shown to the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Profile,
    Technical,
}

/// The next thing to ask the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPrompt {
    pub kind: PromptKind,
    pub number: usize,
    pub total: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub stage: Stage,
    pub profile: CandidateProfile,
    pub questions: Option<QuestionSet>,
    pub answers: Vec<QaPair>,
    /// Per-answer feedback keyed by question number.
    pub instant_evaluations: BTreeMap<usize, AssessmentResponse<SingleEvaluation>>,
    pub final_evaluation: Option<AssessmentResponse<MultiEvaluation>>,
    /// Set once any step had to use a fallback instead of live AI output.
    pub llm_degraded: bool,
    pub transcript: Vec<Turn>,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            stage: Stage::Profile { step: 0 },
            profile: CandidateProfile::default(),
            questions: None,
            answers: Vec::new(),
            instant_evaluations: BTreeMap::new(),
            final_evaluation: None,
            llm_degraded: false,
            transcript: Vec::new(),
        }
    }

    pub fn next_prompt(&self) -> Option<NextPrompt> {
        match self.stage {
            Stage::Profile { step } => ProfileField::at(step).map(|field| NextPrompt {
                kind: PromptKind::Profile,
                number: step + 1,
                total: ProfileField::ALL.len(),
                text: field.prompt().to_string(),
            }),
            Stage::Technical { index } => {
                let questions = self.questions.as_ref()?;
                let (_, text) = questions.iter().nth(index)?;
                Some(NextPrompt {
                    kind: PromptKind::Technical,
                    number: index + 1,
                    total: questions.len(),
                    text: text.to_string(),
                })
            }
            Stage::AwaitingQuestions | Stage::Answered | Stage::Complete => None,
        }
    }

    pub fn progress(&self) -> Progress {
        let completed = (self.profile.len() + self.answers.len()).min(TOTAL_STEPS);
        Progress {
            completed,
            total: TOTAL_STEPS,
            fraction: completed as f64 / TOTAL_STEPS as f64,
        }
    }

    /// Stores the answer to the current profile question. Returns the full
    /// profile once the last field is in, so the caller can generate questions.
    pub fn submit_profile_answer(
        &mut self,
        answer: &str,
    ) -> Result<Option<CandidateProfile>, AppError> {
        let Stage::Profile { step } = self.stage else {
            return Err(AppError::Conflict(
                "The profile has already been completed".to_string(),
            ));
        };
        let answer = non_blank(answer)?;
        let field = ProfileField::at(step)
            .ok_or_else(|| AppError::Conflict("No profile question is pending".to_string()))?;

        if !self.profile.set(field, answer) {
            return Err(AppError::Conflict(format!(
                "'{}' has already been answered",
                field.label()
            )));
        }
        self.record_exchange(field.prompt(), answer);

        if self.profile.is_complete() {
            self.stage = Stage::AwaitingQuestions;
            Ok(Some(self.profile.clone()))
        } else {
            self.stage = Stage::Profile { step: step + 1 };
            Ok(None)
        }
    }

    /// Profile to generate questions from. Stays available until questions
    /// are installed, so a generation whose request was dropped can be rerun.
    pub fn profile_awaiting_questions(&self) -> Result<CandidateProfile, AppError> {
        match self.stage {
            Stage::AwaitingQuestions => Ok(self.profile.clone()),
            Stage::Profile { .. } => Err(AppError::Conflict(
                "The profile must be completed before questions are generated".to_string(),
            )),
            _ => Err(AppError::Conflict(
                "Questions have already been generated for this interview".to_string(),
            )),
        }
    }

    /// Installs the generated questions and opens the technical phase.
    /// A live but partial set is topped up with profile-based questions.
    pub fn install_questions(&mut self, result: StructuredResult<QuestionSet>) -> Result<(), AppError> {
        if self.stage != Stage::AwaitingQuestions {
            return Err(AppError::Conflict(
                "Questions have already been generated for this interview".to_string(),
            ));
        }
        let live = result.is_live();
        let mut questions = result.into_value().unwrap_or_default();
        if !live {
            self.llm_degraded = true;
        }
        if !questions.is_complete() {
            questions.fill_missing_from(&profile_fallback_questions(&self.profile));
        }

        self.questions = Some(questions);
        self.stage = Stage::Technical { index: 0 };
        Ok(())
    }

    /// Records the answer to the current technical question and returns its
    /// question number (1-based) with the pair.
    pub fn submit_answer(&mut self, answer: &str) -> Result<(usize, QaPair), AppError> {
        let Stage::Technical { index } = self.stage else {
            return Err(AppError::Conflict(
                "No technical question is waiting for an answer".to_string(),
            ));
        };
        let answer = non_blank(answer)?;
        let prompt = self
            .next_prompt()
            .ok_or_else(|| AppError::Conflict("No technical question is pending".to_string()))?;

        let pair = QaPair::new(prompt.text.clone(), answer);
        self.answers.push(pair.clone());
        self.record_exchange(&prompt.text, answer);

        self.stage = if index + 1 >= prompt.total {
            Stage::Answered
        } else {
            Stage::Technical { index: index + 1 }
        };
        Ok((index + 1, pair))
    }

    pub fn answer(&self, number: usize) -> Result<&QaPair, AppError> {
        number
            .checked_sub(1)
            .and_then(|i| self.answers.get(i))
            .ok_or_else(|| AppError::NotFound(format!("Answer {number} not found")))
    }

    pub fn record_instant_evaluation(
        &mut self,
        number: usize,
        evaluation: AssessmentResponse<SingleEvaluation>,
    ) {
        if evaluation.source == ResultSource::Fallback {
            self.llm_degraded = true;
        }
        self.instant_evaluations.insert(number, evaluation);
    }

    /// Answers to evaluate, or a conflict if the interview is not finished.
    pub fn pairs_for_final_evaluation(&self) -> Result<Vec<QaPair>, AppError> {
        match self.stage {
            Stage::Answered | Stage::Complete => Ok(self.answers.clone()),
            _ => Err(AppError::Conflict(
                "All technical questions must be answered before the final evaluation"
                    .to_string(),
            )),
        }
    }

    pub fn record_final_evaluation(&mut self, evaluation: AssessmentResponse<MultiEvaluation>) {
        if evaluation.source == ResultSource::Fallback {
            self.llm_degraded = true;
        }
        self.final_evaluation = Some(evaluation);
        self.stage = Stage::Complete;
    }

    fn desired_position(&self) -> &str {
        self.profile
            .get(ProfileField::DesiredPosition)
            .unwrap_or("General")
    }

    /// Role description used when evaluating a single answer.
    pub fn single_context(&self) -> String {
        format!("{} position", self.desired_position())
    }

    /// Role and location description used for the final evaluation.
    pub fn interview_context(&self) -> String {
        format!(
            "{} position at {} location",
            self.desired_position(),
            self.profile
                .get(ProfileField::CurrentLocation)
                .unwrap_or("Various")
        )
    }

    fn record_exchange(&mut self, question: &str, answer: &str) {
        self.transcript.push(Turn {
            speaker: Speaker::Assistant,
            text: question.to_string(),
        });
        self.transcript.push(Turn {
            speaker: Speaker::Candidate,
            text: answer.to_string(),
        });
    }
}

fn non_blank(answer: &str) -> Result<&str, AppError> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }
    Ok(trimmed)
}

/// Questions built from the candidate's own profile, used to fill slots a
/// live generation left empty.
pub fn profile_fallback_questions(profile: &CandidateProfile) -> QuestionSet {
    let tech_stack = profile
        .get(ProfileField::TechStack)
        .unwrap_or("general technologies");
    let position = profile
        .get(ProfileField::DesiredPosition)
        .unwrap_or("the position");

    QuestionSet::from_texts([
        format!("What is your experience with {tech_stack}?"),
        format!("Can you describe a challenging project you've worked on using {tech_stack}?"),
        format!("How do you stay updated with the latest trends in {tech_stack}?"),
        format!("What makes you a good fit for the {position} role?"),
        "What are your career goals for the next 2-3 years?".to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{FailureKind, StructuredOutput};

    const PROFILE_ANSWERS: [&str; 7] = [
        "Ada Park",
        "ada@example.com",
        "+1 555 0100",
        "6",
        "Backend Engineer",
        "Lisbon",
        "Go, PostgreSQL",
    ];

    fn with_profile() -> InterviewSession {
        let mut session = InterviewSession::new();
        for answer in PROFILE_ANSWERS {
            session.submit_profile_answer(answer).unwrap();
        }
        session
    }

    fn in_technical_phase() -> InterviewSession {
        let mut session = with_profile();
        session
            .install_questions(StructuredResult::Ok(QuestionSet::from_texts([
                "q1", "q2", "q3", "q4", "q5",
            ])))
            .unwrap();
        session
    }

    #[test]
    fn test_new_session_starts_at_first_profile_question() {
        let session = InterviewSession::new();
        assert_eq!(session.stage, Stage::Profile { step: 0 });
        let prompt = session.next_prompt().unwrap();
        assert_eq!(prompt.text, "What is your full name?");
        assert_eq!((prompt.number, prompt.total), (1, 7));
        assert_eq!(session.progress().completed, 0);
    }

    #[test]
    fn test_profile_completion_returns_profile() {
        let mut session = InterviewSession::new();
        for answer in &PROFILE_ANSWERS[..6] {
            assert!(session.submit_profile_answer(answer).unwrap().is_none());
        }
        let profile = session.submit_profile_answer("Go, PostgreSQL").unwrap().unwrap();

        assert_eq!(profile.get(ProfileField::TechStack), Some("Go, PostgreSQL"));
        assert_eq!(session.stage, Stage::AwaitingQuestions);
        assert!(session.next_prompt().is_none());
        assert_eq!(session.transcript.len(), 14);
        assert_eq!(session.progress().completed, 7);
    }

    #[test]
    fn test_blank_profile_answer_is_rejected() {
        let mut session = InterviewSession::new();
        assert!(matches!(
            session.submit_profile_answer("   "),
            Err(AppError::Validation(_))
        ));
        assert_eq!(session.stage, Stage::Profile { step: 0 });
    }

    #[test]
    fn test_profile_answer_after_completion_conflicts() {
        let mut session = with_profile();
        assert!(matches!(
            session.submit_profile_answer("late"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_fallback_questions_mark_session_degraded() {
        let mut session = with_profile();
        session
            .install_questions(StructuredResult::Fallback {
                value: QuestionSet::fallback(),
                reason: FailureKind::RateLimited,
            })
            .unwrap();

        assert!(session.llm_degraded);
        assert_eq!(session.questions, Some(QuestionSet::fallback()));
        assert_eq!(session.stage, Stage::Technical { index: 0 });
    }

    #[test]
    fn test_partial_live_set_is_topped_up_from_profile() {
        let mut session = with_profile();
        session
            .install_questions(StructuredResult::Ok(QuestionSet::from_texts([
                "How do goroutines work?",
                "Explain MVCC.",
            ])))
            .unwrap();

        let questions = session.questions.as_ref().unwrap();
        assert!(questions.is_complete());
        assert!(!session.llm_degraded);
        assert_eq!(questions.get(1), Some("How do goroutines work?"));
        assert_eq!(
            questions.get(3),
            Some("How do you stay updated with the latest trends in Go, PostgreSQL?")
        );
        assert_eq!(
            questions.get(4),
            Some("What makes you a good fit for the Backend Engineer role?")
        );
    }

    #[test]
    fn test_profile_stays_available_until_questions_are_installed() {
        let mut session = InterviewSession::new();
        assert!(matches!(
            session.profile_awaiting_questions(),
            Err(AppError::Conflict(_))
        ));

        for answer in PROFILE_ANSWERS {
            session.submit_profile_answer(answer).unwrap();
        }
        let first = session.profile_awaiting_questions().unwrap();
        let again = session.profile_awaiting_questions().unwrap();
        assert_eq!(first, again);
        assert!(first.is_complete());

        session
            .install_questions(StructuredResult::Ok(QuestionSet::fallback()))
            .unwrap();
        assert!(matches!(
            session.profile_awaiting_questions(),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_questions_cannot_be_installed_twice() {
        let mut session = in_technical_phase();
        let again = session.install_questions(StructuredResult::Ok(QuestionSet::fallback()));
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_answers_advance_to_answered() {
        let mut session = in_technical_phase();
        for expected in 1..=5 {
            let prompt = session.next_prompt().unwrap();
            assert_eq!(prompt.kind, PromptKind::Technical);
            let (number, pair) = session.submit_answer("my answer").unwrap();
            assert_eq!(number, expected);
            assert_eq!(pair.question, prompt.text);
        }

        assert_eq!(session.stage, Stage::Answered);
        assert_eq!(session.progress().completed, TOTAL_STEPS);
        assert!((session.progress().fraction - 1.0).abs() < f64::EPSILON);
        assert!(matches!(
            session.submit_answer("extra"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_final_evaluation_requires_all_answers() {
        let mut session = in_technical_phase();
        session.submit_answer("one").unwrap();
        assert!(matches!(
            session.pairs_for_final_evaluation(),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_record_final_evaluation_completes_session() {
        let mut session = in_technical_phase();
        for _ in 0..5 {
            session.submit_answer("answer").unwrap();
        }
        let pairs = session.pairs_for_final_evaluation().unwrap();
        assert_eq!(pairs.len(), 5);

        let envelope = AssessmentResponse::from_result(StructuredResult::Fallback {
            value: MultiEvaluation::fallback(),
            reason: FailureKind::Transient,
        })
        .unwrap();
        session.record_final_evaluation(envelope);

        assert_eq!(session.stage, Stage::Complete);
        assert!(session.llm_degraded);
        assert!(session.final_evaluation.is_some());
    }

    #[test]
    fn test_answer_lookup_is_one_based() {
        let mut session = in_technical_phase();
        session.submit_answer("first").unwrap();
        assert_eq!(session.answer(1).unwrap().answer, "first");
        assert!(matches!(session.answer(0), Err(AppError::NotFound(_))));
        assert!(matches!(session.answer(2), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_contexts_use_profile_or_defaults() {
        let session = with_profile();
        assert_eq!(session.single_context(), "Backend Engineer position");
        assert_eq!(
            session.interview_context(),
            "Backend Engineer position at Lisbon location"
        );

        let blank = InterviewSession::new();
        assert_eq!(blank.single_context(), "General position");
        assert_eq!(blank.interview_context(), "General position at Various location");
    }

    #[test]
    fn test_profile_fallback_without_profile_uses_generic_wording() {
        let questions = profile_fallback_questions(&CandidateProfile::default());
        assert_eq!(
            questions.get(1),
            Some("What is your experience with general technologies?")
        );
        assert_eq!(
            questions.get(4),
            Some("What makes you a good fit for the the position role?")
        );
    }
}

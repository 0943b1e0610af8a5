//! Question generation — five technical questions tailored to a candidate profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::assessment::prompts::QUESTION_GENERATION_TEMPLATE;
use crate::assessment::{fill_template, ScoreAudit};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ExpectedShape, LlmClient, StructuredOutput, StructuredResult};
use crate::models::profile::CandidateProfile;

pub const QUESTION_COUNT: u8 = 5;

const FALLBACK_QUESTIONS: [&str; QUESTION_COUNT as usize] = [
    "What is your experience with the technologies mentioned in your profile?",
    "Can you explain a challenging problem you've solved recently?",
    "How do you approach debugging and troubleshooting issues?",
    "Describe your experience with version control and collaboration tools.",
    "What are your preferred development methodologies and why?",
];

fn question_key(number: u8) -> String {
    format!("question{number}")
}

/// Questions keyed 1..=5. Serialized in the provider's `questionN` form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Map<String, Value>",
    into = "BTreeMap<String, String>"
)]
pub struct QuestionSet {
    questions: BTreeMap<u8, String>,
}

impl QuestionSet {
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        let questions = (1..=QUESTION_COUNT)
            .zip(texts)
            .map(|(n, text)| (n, text.into()))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        Self { questions }
    }

    pub fn get(&self, number: u8) -> Option<&str> {
        self.questions.get(&number).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All five slots hold a question.
    pub fn is_complete(&self) -> bool {
        (1..=QUESTION_COUNT).all(|n| self.questions.contains_key(&n))
    }

    /// Fills empty slots from `other`, keeping the questions already present.
    pub fn fill_missing_from(&mut self, other: &QuestionSet) {
        for (number, text) in &other.questions {
            self.questions
                .entry(*number)
                .or_insert_with(|| text.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.questions.iter().map(|(n, q)| (*n, q.as_str()))
    }
}

impl TryFrom<Map<String, Value>> for QuestionSet {
    type Error = String;

    /// Keeps the non-empty string values under `question1`..`question5`;
    /// anything else in the payload is ignored.
    fn try_from(payload: Map<String, Value>) -> Result<Self, Self::Error> {
        let questions: BTreeMap<u8, String> = (1..=QUESTION_COUNT)
            .filter_map(|n| {
                let text = payload.get(&question_key(n))?.as_str()?.trim();
                (!text.is_empty()).then(|| (n, text.to_string()))
            })
            .collect();

        if questions.is_empty() {
            return Err("payload contains no usable questions".to_string());
        }
        Ok(Self { questions })
    }
}

impl From<QuestionSet> for BTreeMap<String, String> {
    fn from(set: QuestionSet) -> Self {
        set.questions
            .into_iter()
            .map(|(n, text)| (question_key(n), text))
            .collect()
    }
}

impl StructuredOutput for QuestionSet {
    const PURPOSE: &'static str = "question generation";

    fn expected_shape() -> ExpectedShape {
        ExpectedShape::any_of((1..=QUESTION_COUNT).map(question_key))
    }

    fn fallback() -> Self {
        Self::from_texts(FALLBACK_QUESTIONS)
    }
}

impl ScoreAudit for QuestionSet {
    fn score_anomalies(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn build_question_prompt(profile: &CandidateProfile) -> String {
    fill_template(
        QUESTION_GENERATION_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("profile", &profile.as_prompt_lines()),
        ],
    )
}

/// Generates the interview's technical questions. A live reply may hold
/// fewer than five questions; the fallback always holds five.
pub async fn generate_questions(
    llm: &LlmClient,
    profile: &CandidateProfile,
) -> StructuredResult<QuestionSet> {
    let result = llm.request::<QuestionSet>(&build_question_prompt(profile)).await;
    if let StructuredResult::Ok(set) = &result {
        info!("Generated {} interview questions", set.len());
    }
    result
}

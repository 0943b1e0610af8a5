//! Single answer evaluation — five criteria of 20 points each.

use serde::{Deserialize, Serialize};

use crate::assessment::prompts::SINGLE_ANSWER_TEMPLATE;
use crate::assessment::{
    check_range, check_sum, fill_template, lenient_label, log_anomalies, ScoreAudit,
};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, SCORING_SCALE_INSTRUCTION};
use crate::llm_client::{ExpectedShape, LlmClient, StructuredOutput, StructuredResult};

pub const CRITERION_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impression {
    Excellent,
    Good,
    #[default]
    Satisfactory,
    #[serde(rename = "Needs Improvement", alias = "Needs improvement")]
    NeedsImprovement,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedScores {
    pub clarity: f64,
    pub completeness: f64,
    pub accuracy: f64,
    pub relevance: f64,
    pub communication: f64,
}

impl DetailedScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            clarity: score,
            completeness: score,
            accuracy: score,
            relevance: score,
            communication: score,
        }
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("clarity", self.clarity),
            ("completeness", self.completeness),
            ("accuracy", self.accuracy),
            ("relevance", self.relevance),
            ("communication", self.communication),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleEvaluation {
    pub overall_score: f64,
    pub detailed_scores: DetailedScores,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: String,
    #[serde(default, deserialize_with = "lenient_label")]
    pub overall_impression: Impression,
}

impl StructuredOutput for SingleEvaluation {
    const PURPOSE: &'static str = "single answer evaluation";

    fn expected_shape() -> ExpectedShape {
        ExpectedShape::all_of(["overall_score", "detailed_scores"])
    }

    fn fallback() -> Self {
        Self {
            overall_score: 60.0,
            detailed_scores: DetailedScores::uniform(12.0),
            strengths: vec!["Attempted to address the question directly".to_string()],
            weaknesses: vec!["Answer could not be analysed in detail".to_string()],
            improvement_suggestions: vec![
                "Support your answer with a concrete example from your experience".to_string(),
                "Structure the answer: context, approach, result".to_string(),
            ],
            follow_up_questions: vec![
                "Can you walk through a real situation where you applied this?".to_string(),
            ],
            detailed_feedback: "Automated feedback is temporarily unavailable. \
                The answer was recorded; review it against the question and consider \
                adding specific examples and measurable outcomes."
                .to_string(),
            overall_impression: Impression::Satisfactory,
        }
    }
}

impl ScoreAudit for SingleEvaluation {
    fn score_anomalies(&self) -> Vec<String> {
        let mut anomalies = Vec::new();
        check_range("overall_score", self.overall_score, 100.0, &mut anomalies);
        let named = self.detailed_scores.named();
        for (name, score) in named {
            check_range(name, score, CRITERION_MAX, &mut anomalies);
        }
        let parts: Vec<f64> = named.iter().map(|(_, s)| *s).collect();
        check_sum("detailed_scores", &parts, self.overall_score, &mut anomalies);
        anomalies
    }
}

pub fn build_single_prompt(question: &str, answer: &str, context: &str) -> String {
    fill_template(
        SINGLE_ANSWER_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("scale", SCORING_SCALE_INSTRUCTION),
            ("context", context),
            ("question", question),
            ("answer", answer),
        ],
    )
}

/// Scores one answer. `context` describes the role, e.g. "Backend Engineer position".
pub async fn evaluate_single_answer(
    llm: &LlmClient,
    question: &str,
    answer: &str,
    context: &str,
) -> StructuredResult<SingleEvaluation> {
    let result = llm
        .request::<SingleEvaluation>(&build_single_prompt(question, answer, context))
        .await;
    log_anomalies(SingleEvaluation::PURPOSE, &result);
    result
}

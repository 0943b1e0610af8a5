//! Answer comparison — two answers to the same question, scored side by side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::prompts::COMPARISON_TEMPLATE;
use crate::assessment::{check_range, fill_template, lenient_label, log_anomalies, ScoreAudit};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ExpectedShape, LlmClient, StructuredOutput, StructuredResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    #[serde(alias = "A", alias = "answer a")]
    AnswerA,
    #[serde(alias = "B", alias = "answer b")]
    AnswerB,
    #[default]
    #[serde(alias = "Tie")]
    Tie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectComparison {
    /// Unknown labels read as a tie; only the overall winner is strict.
    #[serde(default, deserialize_with = "lenient_label")]
    pub winner: Winner,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerComparison {
    pub answer_a_score: f64,
    pub answer_b_score: f64,
    #[serde(default)]
    pub comparison: BTreeMap<String, AspectComparison>,
    #[serde(default)]
    pub key_differences: Vec<String>,
    #[serde(default)]
    pub summary: String,
    pub winner: Winner,
}

impl StructuredOutput for AnswerComparison {
    const PURPOSE: &'static str = "answer comparison";

    fn expected_shape() -> ExpectedShape {
        ExpectedShape::all_of(["answer_a_score", "answer_b_score", "winner"])
    }

    fn fallback() -> Self {
        Self {
            answer_a_score: 50.0,
            answer_b_score: 50.0,
            comparison: BTreeMap::new(),
            key_differences: Vec::new(),
            summary: "Automated comparison is temporarily unavailable; \
                both answers were recorded without a verdict."
                .to_string(),
            winner: Winner::Tie,
        }
    }
}

impl ScoreAudit for AnswerComparison {
    /// Also flags a declared winner that contradicts the scores.
    fn score_anomalies(&self) -> Vec<String> {
        let mut anomalies = Vec::new();
        check_range("answer_a_score", self.answer_a_score, 100.0, &mut anomalies);
        check_range("answer_b_score", self.answer_b_score, 100.0, &mut anomalies);

        let by_score = if self.answer_a_score > self.answer_b_score {
            Winner::AnswerA
        } else if self.answer_b_score > self.answer_a_score {
            Winner::AnswerB
        } else {
            Winner::Tie
        };
        if by_score != self.winner && by_score != Winner::Tie {
            anomalies.push(format!(
                "winner is {:?} but scores favour {:?}",
                self.winner, by_score
            ));
        }
        anomalies
    }
}

pub fn build_comparison_prompt(
    question: &str,
    answer_a: &str,
    answer_b: &str,
    context: &str,
) -> String {
    fill_template(
        COMPARISON_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("context", context),
            ("question", question),
            ("answer_a", answer_a),
            ("answer_b", answer_b),
        ],
    )
}

pub async fn compare_answers(
    llm: &LlmClient,
    question: &str,
    answer_a: &str,
    answer_b: &str,
    context: &str,
) -> StructuredResult<AnswerComparison> {
    let result = llm
        .request::<AnswerComparison>(&build_comparison_prompt(
            question, answer_a, answer_b, context,
        ))
        .await;
    log_anomalies(AnswerComparison::PURPOSE, &result);
    result
}

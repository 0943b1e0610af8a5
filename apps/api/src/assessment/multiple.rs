//! Whole-interview evaluation — per-question scores, five categories and a readiness label.

use serde::{Deserialize, Serialize};

use crate::assessment::prompts::MULTIPLE_ANSWERS_TEMPLATE;
use crate::assessment::{check_range, check_sum, fill_template, log_anomalies, ScoreAudit};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, SCORING_SCALE_INSTRUCTION};
use crate::llm_client::{ExpectedShape, LlmClient, StructuredOutput, StructuredResult};
use crate::models::qa::QaPair;

pub const CATEGORY_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    Ready,
    #[serde(rename = "Nearly Ready")]
    NearlyReady,
    #[serde(rename = "Needs Preparation")]
    NeedsPreparation,
    #[serde(rename = "Significant Preparation Needed")]
    SignificantPreparationNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub technical_knowledge: f64,
    pub problem_solving: f64,
    pub communication: f64,
    pub experience: f64,
    pub best_practices: f64,
}

impl CategoryScores {
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("technical_knowledge", self.technical_knowledge),
            ("problem_solving", self.problem_solving),
            ("communication", self.communication),
            ("experience", self.experience),
            ("best_practices", self.best_practices),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualScore {
    pub question_number: u32,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiEvaluation {
    pub overall_score: f64,
    pub category_scores: CategoryScores,
    #[serde(default)]
    pub individual_scores: Vec<IndividualScore>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub standout_moments: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: String,
    pub interview_readiness: Readiness,
}

impl StructuredOutput for MultiEvaluation {
    const PURPOSE: &'static str = "interview evaluation";

    fn expected_shape() -> ExpectedShape {
        ExpectedShape::all_of(["overall_score", "category_scores", "interview_readiness"])
    }

    fn fallback() -> Self {
        Self {
            overall_score: 70.0,
            category_scores: CategoryScores {
                technical_knowledge: 14.0,
                problem_solving: 14.0,
                communication: 14.0,
                experience: 14.0,
                best_practices: 14.0,
            },
            individual_scores: Vec::new(),
            strengths: vec![
                "Shows technical understanding".to_string(),
                "Communicates clearly".to_string(),
            ],
            areas_for_improvement: vec![
                "Could provide more specific examples".to_string(),
                "Consider exploring advanced topics".to_string(),
            ],
            recommendations: vec![
                "Practise answering with concrete project examples".to_string(),
            ],
            standout_moments: Vec::new(),
            detailed_feedback: "The candidate demonstrates good foundational knowledge and \
                communication skills. There's potential for growth with more practical experience."
                .to_string(),
            interview_readiness: Readiness::NearlyReady,
        }
    }
}

impl ScoreAudit for MultiEvaluation {
    fn score_anomalies(&self) -> Vec<String> {
        let mut anomalies = Vec::new();
        check_range("overall_score", self.overall_score, 100.0, &mut anomalies);
        let named = self.category_scores.named();
        for (name, score) in named {
            check_range(name, score, CATEGORY_MAX, &mut anomalies);
        }
        let parts: Vec<f64> = named.iter().map(|(_, s)| *s).collect();
        check_sum("category_scores", &parts, self.overall_score, &mut anomalies);
        for item in &self.individual_scores {
            check_range(
                &format!("question {} score", item.question_number),
                item.score,
                100.0,
                &mut anomalies,
            );
        }
        anomalies
    }
}

fn format_pairs(pairs: &[QaPair]) -> String {
    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            format!(
                "Q{n}: {q}\nA{n}: {a}",
                n = i + 1,
                q = pair.question,
                a = pair.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_multiple_prompt(pairs: &[QaPair], context: &str) -> String {
    let count = pairs.len().to_string();
    fill_template(
        MULTIPLE_ANSWERS_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("scale", SCORING_SCALE_INSTRUCTION),
            ("count", &count),
            ("context", context),
            ("qa_pairs", &format_pairs(pairs)),
        ],
    )
}

/// Scores a full set of answers. `context` describes the role and location.
pub async fn evaluate_multiple_answers(
    llm: &LlmClient,
    pairs: &[QaPair],
    context: &str,
) -> StructuredResult<MultiEvaluation> {
    let result = llm
        .request::<MultiEvaluation>(&build_multiple_prompt(pairs, context))
        .await;
    log_anomalies(MultiEvaluation::PURPOSE, &result);
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm_client::retry::RetryPolicy;
    use crate::llm_client::testing::{failure_matrix, ScriptedGenerator};
    use crate::llm_client::FailureKind;

    fn client(generator: Arc<ScriptedGenerator>) -> LlmClient {
        LlmClient::new(generator, Some("m".to_string()), RetryPolicy::default())
    }

    fn pairs() -> Vec<QaPair> {
        vec![
            QaPair::new("What is ownership?", "Each value has one owner."),
            QaPair::new("What is a trait object?", "Dynamic dispatch via dyn."),
        ]
    }

    fn live_reply(readiness: &str) -> String {
        json!({
            "overall_score": 80,
            "category_scores": {
                "technical_knowledge": 18,
                "problem_solving": 16,
                "communication": 16,
                "experience": 14,
                "best_practices": 16
            },
            "individual_scores": [
                {"question_number": 1, "score": 85, "feedback": "Precise."},
                {"question_number": 2, "score": 75, "feedback": "Brief."}
            ],
            "strengths": ["Rust fundamentals"],
            "areas_for_improvement": ["Depth"],
            "recommendations": ["Read the nomicon"],
            "standout_moments": ["Ownership answer"],
            "detailed_feedback": "Good.",
            "interview_readiness": readiness
        })
        .to_string()
    }

    #[test]
    fn test_readiness_labels() {
        for (label, expected) in [
            ("\"Ready\"", Readiness::Ready),
            ("\"Nearly Ready\"", Readiness::NearlyReady),
            ("\"Needs Preparation\"", Readiness::NeedsPreparation),
            (
                "\"Significant Preparation Needed\"",
                Readiness::SignificantPreparationNeeded,
            ),
        ] {
            assert_eq!(serde_json::from_str::<Readiness>(label).unwrap(), expected);
        }
    }

    #[test]
    fn test_fallback_is_consistent() {
        let fallback = MultiEvaluation::fallback();
        assert!(fallback.score_anomalies().is_empty());
        assert_eq!(fallback.interview_readiness, Readiness::NearlyReady);
    }

    #[test]
    fn test_prompt_numbers_pairs() {
        let prompt = build_multiple_prompt(&pairs(), "Rust Engineer position at Berlin location");
        assert!(prompt.contains("Q1: What is ownership?\nA1: Each value has one owner."));
        assert!(prompt.contains("Q2: What is a trait object?"));
        assert!(prompt.contains("Score each of the 2 answers"));
        assert!(prompt.contains("Significant Preparation Needed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_evaluation() {
        let generator = Arc::new(ScriptedGenerator::replying(&live_reply("Ready"), 1));
        let result = evaluate_multiple_answers(&client(generator), &pairs(), "ctx").await;

        assert!(result.is_live());
        let eval = result.value().unwrap();
        assert_eq!(eval.overall_score, 80.0);
        assert_eq!(eval.individual_scores.len(), 2);
        assert_eq!(eval.interview_readiness, Readiness::Ready);
        assert!(eval.score_anomalies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_readiness_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying(&live_reply("Hire now"), 1));
        let result = evaluate_multiple_answers(&client(generator), &pairs(), "ctx").await;

        assert_eq!(result.failure(), Some(FailureKind::Malformed));
        assert_eq!(result.value(), Some(&MultiEvaluation::fallback()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_failure_kind_yields_fallback() {
        for (llm, kind) in failure_matrix() {
            let result = evaluate_multiple_answers(&llm, &pairs(), "ctx").await;
            assert_eq!(
                result,
                StructuredResult::Fallback {
                    value: MultiEvaluation::fallback(),
                    reason: kind,
                },
                "failure kind {kind}"
            );
        }
    }
}

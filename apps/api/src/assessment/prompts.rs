// All LLM prompt templates for the assessment module.
// Placeholders are `{name}`; every template ends with `{json_only}`.

/// Question generation. Replace: {profile}, {json_only}
pub const QUESTION_GENERATION_TEMPLATE: &str = r#"You are a senior technical interviewer preparing a screening interview.

CANDIDATE PROFILE:
{profile}

Write exactly 5 technical interview questions tailored to the candidate's tech stack,
desired position and years of experience. Mix conceptual, practical and
problem-solving questions. Each question must stand on its own and be answerable
in a few paragraphs.

Return a JSON object with this EXACT schema:
{
  "question1": "...",
  "question2": "...",
  "question3": "...",
  "question4": "...",
  "question5": "..."
}

{json_only}"#;

/// Single answer evaluation. Replace: {context}, {question}, {answer}, {scale}, {json_only}
pub const SINGLE_ANSWER_TEMPLATE: &str = r#"You are an experienced technical interviewer evaluating one answer for a {context}.

QUESTION:
{question}

CANDIDATE ANSWER:
{answer}

Score the answer on five criteria, each out of 20:
- clarity: is the answer well structured and easy to follow?
- completeness: does it cover the important parts of the question?
- accuracy: is it technically correct?
- relevance: does it stay on the question asked?
- communication: is it expressed the way a professional would explain it?
{scale}

Return a JSON object with this EXACT schema:
{
  "overall_score": 0,
  "detailed_scores": {
    "clarity": 0,
    "completeness": 0,
    "accuracy": 0,
    "relevance": 0,
    "communication": 0
  },
  "strengths": ["..."],
  "weaknesses": ["..."],
  "improvement_suggestions": ["..."],
  "follow_up_questions": ["..."],
  "detailed_feedback": "...",
  "overall_impression": "Excellent | Good | Satisfactory | Needs Improvement | Poor"
}

{json_only}"#;

/// Whole interview evaluation. Replace: {context}, {qa_pairs}, {count}, {scale}, {json_only}
pub const MULTIPLE_ANSWERS_TEMPLATE: &str = r#"You are a hiring panel lead reviewing a complete technical interview for a {context}.

QUESTIONS AND ANSWERS:
{qa_pairs}

Score each of the {count} answers out of 100, then score the candidate on five
categories, each out of 20:
- technical_knowledge
- problem_solving
- communication
- experience
- best_practices (professionalism and engineering best practices)
{scale}

Pick interview_readiness from exactly one of:
"Ready", "Nearly Ready", "Needs Preparation", "Significant Preparation Needed".

Return a JSON object with this EXACT schema:
{
  "overall_score": 0,
  "category_scores": {
    "technical_knowledge": 0,
    "problem_solving": 0,
    "communication": 0,
    "experience": 0,
    "best_practices": 0
  },
  "individual_scores": [
    {"question_number": 1, "score": 0, "feedback": "..."}
  ],
  "strengths": ["..."],
  "areas_for_improvement": ["..."],
  "recommendations": ["..."],
  "standout_moments": ["..."],
  "detailed_feedback": "...",
  "interview_readiness": "Ready"
}

{json_only}"#;

/// Answer comparison. Replace: {context}, {question}, {answer_a}, {answer_b}, {json_only}
pub const COMPARISON_TEMPLATE: &str = r#"You are a technical interviewer comparing two answers to the same question for a {context}.

QUESTION:
{question}

ANSWER A:
{answer_a}

ANSWER B:
{answer_b}

Score each answer out of 100. Compare them on the aspects clarity, completeness,
accuracy, relevance and communication; for each aspect name the better answer
("answer_a", "answer_b" or "tie") and explain why in one sentence.

Return a JSON object with this EXACT schema:
{
  "answer_a_score": 0,
  "answer_b_score": 0,
  "comparison": {
    "clarity": {"winner": "answer_a", "notes": "..."}
  },
  "key_differences": ["..."],
  "summary": "...",
  "winner": "answer_a | answer_b | tie"
}

{json_only}"#;

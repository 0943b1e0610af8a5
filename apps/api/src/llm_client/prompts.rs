// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to every prompt that expects a structured reply.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Scoring scale shared by the evaluation prompts.
pub const SCORING_SCALE_INSTRUCTION: &str = "\
    Scores are integers. Each sub-score or category score is between 0 and 20; \
    overall scores are between 0 and 100 and should equal the sum of the five \
    sub-scores or category scores.";

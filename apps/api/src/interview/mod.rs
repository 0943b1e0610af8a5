// Interview flow: a seven-step profile wizard, five technical questions,
// optional per-answer feedback and a final evaluation.
// Sessions live in memory only; all LLM work is delegated to assessment.

pub mod handlers;
pub mod session;
pub mod store;

// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts.rs alongside it;
// this file only holds cross-cutting pieces.

/// Appended to every system prompt that expects a JSON envelope back.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Return ONLY the JSON object described above. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

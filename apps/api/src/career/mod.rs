// 7-Day Challenge career simulator.
// All LLM calls go through llm_client — the engine only sees the PromptClient trait.

pub mod engine;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod rules;

#[cfg(test)]
pub mod testing;

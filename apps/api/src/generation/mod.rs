// Whole-document generation: template filling from a bio and the page squeezer.
// All LLM calls go through the TextGenerator trait, never the Anthropic API directly.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod templates;

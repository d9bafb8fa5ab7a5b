// Incident extraction: normalization, prompt strategies, response parsing.
// All model calls go through llm_client; nothing here talks HTTP directly.

pub mod handlers;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod signature;
pub mod strategy;

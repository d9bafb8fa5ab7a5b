use std::sync::Arc;

use crate::config::Config;
use crate::extraction::strategy::PromptStrategy;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Outbound model client. `OllamaClient` in production, a stub in tests.
    pub llm: Arc<dyn LlmGateway>,
    /// Prompt builder selected by `EXTRACTION_STRATEGY`. For the signature
    /// strategy this carries the extractor compiled at startup.
    pub strategy: Arc<dyn PromptStrategy>,
    pub config: Config,
}

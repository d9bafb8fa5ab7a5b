//! Prompt strategies — pluggable, trait-based prompt builders.
//!
//! Default: `ExplicitPromptStrategy` (instruction + JSON Schema + worked example).
//! Alternative: `SignatureStrategy` (declarative signature compiled at startup).
//!
//! `AppState` holds an `Arc<dyn PromptStrategy>`, chosen once via config.

use std::sync::Arc;

use tracing::info;

use crate::config::StrategyKind;
use crate::extraction::normalize::normalize;
use crate::extraction::prompts::{example_output, EXAMPLE_INPUT, EXTRACTION_PROMPT_TEMPLATE};
use crate::extraction::signature::{incident_signature, CompileError, LabeledFewShot, SignatureStrategy};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmRequest;
use crate::models::incident::IncidentOutput;

/// Builds the outbound request for one incident text.
///
/// Implementations own their normalization policy: `preprocess` runs first,
/// `build` receives its output.
pub trait PromptStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn preprocess(&self, text: &str) -> String;

    fn build(&self, processed_text: &str) -> LlmRequest;
}

/// One completion prompt per request, rebuilt every time. Deterministic.
pub struct ExplicitPromptStrategy {
    schema: String,
    example_output: String,
}

impl ExplicitPromptStrategy {
    pub fn new() -> Self {
        Self {
            schema: IncidentOutput::json_schema_pretty(),
            example_output: serde_json::to_string_pretty(&example_output())
                .unwrap_or_else(|_| "{}".to_string()),
        }
    }
}

impl Default for ExplicitPromptStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptStrategy for ExplicitPromptStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Prompt.as_str()
    }

    fn preprocess(&self, text: &str) -> String {
        normalize(text)
    }

    fn build(&self, processed_text: &str) -> LlmRequest {
        let prompt = EXTRACTION_PROMPT_TEMPLATE
            .replace("{instruction}", JSON_ONLY_INSTRUCTION)
            .replace("{schema}", &self.schema)
            .replace("{example_input}", EXAMPLE_INPUT)
            .replace("{example_output}", &self.example_output)
            // Last, so braces in user text are never treated as placeholders.
            .replace("{text}", processed_text);
        LlmRequest::Completion { system: None, prompt }
    }
}

/// Builds the configured strategy. The signature strategy is compiled here,
/// once; a compile failure aborts startup.
pub fn build_strategy(kind: StrategyKind) -> Result<Arc<dyn PromptStrategy>, CompileError> {
    match kind {
        StrategyKind::Prompt => Ok(Arc::new(ExplicitPromptStrategy::new())),
        StrategyKind::Signature => {
            let (signature, trainset) = incident_signature();
            let compiled = LabeledFewShot::new(1).compile(&signature, &trainset)?;
            info!(
                "Signature compiled: {} output fields, {} demo(s)",
                signature.outputs.len(),
                compiled.demo_count()
            );
            Ok(Arc::new(SignatureStrategy::new(compiled)))
        }
    }
}
